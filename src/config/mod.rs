//! Configuration loading.

mod settings;

pub use settings::{Config, LoggingConfig, RecurrenceConfig, StorageConfig};
