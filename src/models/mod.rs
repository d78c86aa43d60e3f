// src/models/mod.rs

//! Domain models for the watcher.

mod comic;
mod config;

// Re-export all public types
pub use comic::{COMIC_KIND, ComicRecord, ComicSource, Identifier};
pub use config::{
    CacheConfig, Config, FetcherConfig, MailConfig, ServerConfig, SourceConfig, SourcesConfig,
    StorageBackend, StorageConfig, TemplateConfig,
};
