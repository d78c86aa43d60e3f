//! Service layer for the watcher.
//!
//! This module contains:
//! - Page fetching (`Fetcher`, `HttpFetcher`)
//! - Per-source extraction rules (`extractors`)
//! - The latest-identifier cache (`TtlCache`)
//! - Source providers and their registry (`ComicProvider`, `ProviderRegistry`)
//! - Template rendering (`TemplateService`)
//! - Notification mails (`Notifier`, `Mailer`)

mod cache;
pub mod extractors;
mod fetcher;
mod notifier;
mod providers;
mod templates;

pub use cache::TtlCache;
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
pub use notifier::{EmailMessage, HttpMailer, LogMailer, Mailer, Notifier};
pub use providers::{ComicProvider, LatestProvider, ProviderRegistry};
pub use templates::TemplateService;

#[cfg(test)]
pub(crate) use notifier::testing;
