//! Command implementations for the CLI.

mod config;
mod cursor;
mod ingest;
mod records;
mod report;

pub use config::cmd_config;
pub use cursor::cmd_cursor;
pub use ingest::{IngestArgs, cmd_ingest};
pub use records::{RecordsArgs, cmd_records};
pub use report::cmd_report;
