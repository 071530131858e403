/// Data layer: core types, loading, lookups and aggregations.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (raw text or typed)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Record>, shared schema
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐  ┌──────────┐  ┌───────────┐
///   │  lookup   │  │  derive   │─▶│ aggregate  │
///   └──────────┘  └──────────┘  └───────────┘
///   projections    new columns    grouped stats
/// ```

pub mod aggregate;
pub mod dates;
pub mod derive;
pub mod loader;
pub mod lookup;
pub mod model;
