//! Local filesystem storage implementation.
//!
//! One JSON document per record at `{root}/records/{kind}/{source}.json`.
//! Writes go to a temp file first and are renamed into place, so a reader
//! never sees a half-written record.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ComicRecord;
use crate::storage::RecordStore;

/// Suffix source for temp files, unique within the process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Key of the directory holding every record of `kind`.
    fn kind_key(kind: &str) -> String {
        format!("records/{}", kind)
    }

    /// Key of the document holding one record.
    fn record_key(record: &ComicRecord) -> String {
        format!("{}/{}.json", Self::kind_key(&record.kind), record.source)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Keys of every record document of `kind`, sorted.
    async fn list_record_keys(&self, kind: &str) -> Result<Vec<String>> {
        let dir_key = Self::kind_key(kind);
        let mut entries = match tokio::fs::read_dir(self.path(&dir_key)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.ends_with(".json") {
                keys.push(format!("{}/{}", dir_key, name));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl RecordStore for LocalStorage {
    async fn load_records(&self, kind: &str, limit: usize) -> Result<Vec<ComicRecord>> {
        let mut records = Vec::new();
        for key in self.list_record_keys(kind).await? {
            if records.len() >= limit {
                break;
            }
            match self.read_json::<ComicRecord>(&key).await {
                Ok(Some(record)) if record.kind == kind => records.push(record),
                Ok(Some(record)) => {
                    log::warn!("Skipping {}: tagged {:?}, expected {:?}", key, record.kind, kind);
                }
                Ok(None) => {}
                Err(e) => log::warn!("Skipping unreadable record {}: {}", key, e),
            }
        }
        Ok(records)
    }

    async fn put_record(&self, record: &ComicRecord) -> Result<()> {
        let key = Self::record_key(record);
        self.write_json(&key, record).await?;
        log::debug!("Stored record {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COMIC_KIND, ComicSource, Identifier};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.load_records(COMIC_KIND, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_and_load_records() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut xkcd = ComicRecord::new(ComicSource::Xkcd);
        xkcd.set_last_seen(&Identifier::Pair("http://img/1.png".into(), "Title A".into()))
            .unwrap();
        let jl8 = ComicRecord::new(ComicSource::Jl8);

        storage.put_record(&xkcd).await.unwrap();
        storage.put_record(&jl8).await.unwrap();
        assert!(tmp.path().join("records/comic/xkcd.json").exists());

        let loaded = storage.load_records(COMIC_KIND, 100).await.unwrap();
        assert_eq!(loaded, vec![jl8, xkcd]);
    }

    #[tokio::test]
    async fn test_put_replaces_same_source() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut record = ComicRecord::new(ComicSource::Jl8);
        record.set_last_seen(&Identifier::Number(41)).unwrap();
        storage.put_record(&record).await.unwrap();
        record.set_last_seen(&Identifier::Number(42)).unwrap();
        storage.put_record(&record).await.unwrap();

        let loaded = storage.load_records(COMIC_KIND, 100).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].last_seen(), Some(Identifier::Number(42)));
    }

    #[tokio::test]
    async fn test_load_respects_limit_and_kind() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        for source in ComicSource::ALL {
            storage.put_record(&ComicRecord::new(source)).await.unwrap();
        }
        let mut other = ComicRecord::new(ComicSource::Xkcd);
        other.kind = "feed".to_string();
        storage.put_record(&other).await.unwrap();

        assert_eq!(storage.load_records(COMIC_KIND, 2).await.unwrap().len(), 2);
        assert_eq!(storage.load_records(COMIC_KIND, 100).await.unwrap().len(), 3);
        assert_eq!(storage.load_records("feed", 100).await.unwrap(), vec![other]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_leave_one_valid_document() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let writes = (0..16).map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move {
                let mut record = ComicRecord::new(ComicSource::Smbc);
                let url = format!("http://s/{}.png", "x".repeat((16 - i) * 40));
                record.set_last_seen(&Identifier::Url(url)).unwrap();
                storage.put_record(&record).await
            })
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap().unwrap();
        }

        let loaded = storage.load_records(COMIC_KIND, 100).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].last_seen().is_some());

        let files = std::fs::read_dir(tmp.path().join("records/comic")).unwrap().count();
        assert_eq!(files, 1);
    }

    #[tokio::test]
    async fn test_unreadable_record_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.put_record(&ComicRecord::new(ComicSource::Smbc)).await.unwrap();
        storage
            .write_bytes("records/comic/broken.json", b"{ not json")
            .await
            .unwrap();

        let loaded = storage.load_records(COMIC_KIND, 100).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source, "smbc");
    }

    #[tokio::test]
    async fn test_malformed_last_seen_survives_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_bytes(
                "records/comic/jl8.json",
                br#"{"source": "jl8", "kind": "comic", "last_json": "not-json["}"#,
            )
            .await
            .unwrap();

        let loaded = storage.load_records(COMIC_KIND, 100).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].last_seen(), None);
    }
}
