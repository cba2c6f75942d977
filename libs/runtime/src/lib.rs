//! Process-level plumbing shared by the binaries: layered configuration
//! loading, home directory resolution and tracing initialisation.

pub mod config;
pub mod home_dir;
pub mod logging;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, TableConfig};
pub use logging::init_logging_from_config;
