// src/pipeline/cron.rs

//! One pass over every known source: fetch latest, compare with the stored
//! last-seen value, notify and persist on change.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{COMIC_KIND, ComicRecord, ComicSource, Identifier};
use crate::services::{LatestProvider, Notifier, ProviderRegistry};
use crate::storage::RecordStore;

/// What happened during a cron pass.
#[derive(Debug, Default, Clone)]
pub struct CronReport {
    /// Human-readable trace, one line per event
    pub lines: Vec<String>,
    /// Sources that were checked, in order
    pub checked: Vec<ComicSource>,
    /// Sources a notification was sent for
    pub notified: Vec<ComicSource>,
    /// Records persisted successfully
    pub written: usize,
    /// Records whose write failed, with the reason
    pub write_failures: Vec<(ComicSource, String)>,
}

impl CronReport {
    fn trace(
        &mut self,
        source: ComicSource,
        latest: Option<&Identifier>,
        last: Option<&Identifier>,
    ) {
        let latest = latest.map_or_else(|| "not found".to_string(), ToString::to_string);
        let last = last.map_or_else(|| "null".to_string(), ToString::to_string);
        self.lines.push(format!("{source}: latest={latest} last_seen={last}"));
        self.checked.push(source);
    }

    fn write_failed(&mut self, source: ComicSource, reason: String) {
        log::error!("Failed to store record for {}: {}", source, reason);
        self.lines.push(format!("{source}: write failed: {reason}"));
        self.write_failures.push((source, reason));
    }

    pub fn has_write_failures(&self) -> bool {
        !self.write_failures.is_empty()
    }

    /// Plain-text trace followed by `Done.`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("Done.");
        out
    }
}

/// Run one cron pass.
///
/// Fetch and notification errors stop the pass; writes already issued are
/// still waited for before the error is returned. A failed write does not
/// affect the others and is reported in [`CronReport::write_failures`].
pub async fn run_cron(
    registry: &ProviderRegistry,
    store: Arc<dyn RecordStore>,
    notifier: &Notifier,
    fetch_limit: usize,
) -> Result<CronReport> {
    let records = collect_records(registry, store.as_ref(), fetch_limit).await?;
    log::info!("Cron pass over {} sources", records.len());

    let mut report = CronReport::default();
    let mut pending: Vec<(ComicSource, JoinHandle<Result<()>>)> = Vec::new();
    let mut outcome = Ok(());

    for (source, mut record) in records {
        let Some(provider) = registry.get(source) else {
            continue;
        };

        match check_source(provider.as_ref(), &mut record, notifier, &mut report).await {
            Ok(true) => {
                let store = Arc::clone(&store);
                let handle = tokio::spawn(async move { store.put_record(&record).await });
                pending.push((source, handle));
            }
            Ok(false) => {}
            Err(e) => {
                log::error!("Cron pass stopped at {}: {}", source, e);
                outcome = Err(e);
                break;
            }
        }
    }

    let results = join_all(
        pending
            .into_iter()
            .map(|(source, handle)| async move { (source, handle.await) }),
    )
    .await;

    for (source, result) in results {
        match result {
            Ok(Ok(())) => report.written += 1,
            Ok(Err(e)) => report.write_failed(source, e.to_string()),
            Err(e) => report.write_failed(source, e.to_string()),
        }
    }

    outcome?;

    log::info!(
        "Cron pass complete: {} checked, {} notified, {} written, {} write failures",
        report.checked.len(),
        report.notified.len(),
        report.written,
        report.write_failures.len()
    );
    Ok(report)
}

/// Stored records for registered sources, plus a fresh record for every
/// registered source that has none yet.
async fn collect_records(
    registry: &ProviderRegistry,
    store: &dyn RecordStore,
    fetch_limit: usize,
) -> Result<Vec<(ComicSource, ComicRecord)>> {
    let mut missing = registry.sources();
    let mut records = Vec::new();

    for record in store.load_records(COMIC_KIND, fetch_limit).await? {
        match record.comic_source() {
            Ok(source) if registry.get(source).is_some() => {
                missing.retain(|s| *s != source);
                records.push((source, record));
            }
            Ok(source) => log::warn!("Skipping record for disabled source {}", source),
            Err(e) => log::warn!("Skipping stored record: {}", e),
        }
    }

    records.extend(missing.into_iter().map(|s| (s, ComicRecord::new(s))));
    Ok(records)
}

/// Check one source. Returns whether the record changed and needs a write.
async fn check_source(
    provider: &dyn LatestProvider,
    record: &mut ComicRecord,
    notifier: &Notifier,
    report: &mut CronReport,
) -> Result<bool> {
    let source = provider.source();
    let latest = provider.latest().await?;
    let last_seen = record.last_seen();
    report.trace(source, latest.as_ref(), last_seen.as_ref());

    let Some(latest) = latest else {
        return Ok(false);
    };
    if last_seen.as_ref() == Some(&latest) {
        return Ok(false);
    }

    notifier.notify(source, &latest).await?;
    record.set_last_seen(&latest)?;
    report.notified.push(source);
    Ok(true)
}
