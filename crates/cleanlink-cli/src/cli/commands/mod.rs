//! CLI command handlers, one file per command.

mod check;
mod clean;
mod expand;
mod export_csv;
mod history;
mod input;
mod license;
mod serve;

pub use check::run_check;
pub use clean::{run_clean, CleanOptions};
pub use expand::run_expand;
pub use export_csv::run_export_csv;
pub use history::{run_history, run_history_clear};
pub use license::run_license;
pub use serve::run_serve;
