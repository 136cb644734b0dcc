//! Offline output: trajectory CSV, run summary JSON, console rule table.

pub mod csv;
pub mod json;
pub mod table;

pub use json::RunSummary;
pub use table::render_rule_table;
