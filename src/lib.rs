//! Exploratory analysis of mobile device specification tables: load a
//! delimited file, look devices up, aggregate and rank them, and hand the
//! results to a text table or an external chart renderer.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod ui;

// Re-exports for library users
pub use config::AnalysisConfig;
pub use data::loader::{load_file, load_records, load_typed, LoadOptions};
pub use data::model::{Record, Table, Value};
pub use error::{AnalysisError, LoadError, ShapeError};
pub use ui::render_table;
