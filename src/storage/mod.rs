//! Storage for occurrences.
//!
//! - `OccurrenceStore`: the port the calendar engines are written against
//! - `EmbeddedOccurrenceStore`: in-memory backend with optional JSON persistence

mod embedded;
mod traits;

pub use embedded::EmbeddedOccurrenceStore;
pub use traits::*;

use crate::config::Config;
use crate::error::Result;

/// Create the embedded store described by `config`.
pub async fn create_store(config: &Config) -> Result<EmbeddedOccurrenceStore> {
    if config.storage.persist {
        let data_dir = config.data_dir()?;
        EmbeddedOccurrenceStore::with_persistence(&data_dir).await
    } else {
        Ok(EmbeddedOccurrenceStore::new())
    }
}
