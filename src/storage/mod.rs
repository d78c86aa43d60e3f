//! Storage abstractions for last-seen records.
//!
//! ## Directory Structure (local backend)
//!
//! ```text
//! storage/
//! └── records/
//!     └── comic/            # one directory per record kind
//!         ├── jl8.json
//!         ├── smbc.json
//!         └── xkcd.json
//! ```

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ComicRecord, StorageBackend, StorageConfig};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load up to `limit` records tagged `kind`, ordered by source.
    async fn load_records(&self, kind: &str, limit: usize) -> Result<Vec<ComicRecord>>;

    /// Insert or replace the record for `record.source`.
    async fn put_record(&self, record: &ComicRecord) -> Result<()>;
}

/// Open the backend `config` asks for.
pub fn open(config: &StorageConfig) -> Arc<dyn RecordStore> {
    match config.backend {
        StorageBackend::Local => {
            log::info!("Using local record storage at {}", config.dir.display());
            Arc::new(LocalStorage::new(&config.dir))
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory record storage; records are lost on exit");
            Arc::new(MemoryStorage::new())
        }
    }
}
