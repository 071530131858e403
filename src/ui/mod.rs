//! Presentation: aligned text tables for the terminal and chart
//! specifications for an external renderer.

pub mod chart;
pub mod table;

pub use table::{render_table, TableRow};
