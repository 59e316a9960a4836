use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use crate::models::{self, PageRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on metadata file")]
    Io(#[from] std::io::Error),
    #[error("metadata file is not a valid page index")]
    Corrupt(#[from] serde_json::Error),
    #[error("page not found: {0}, download the page first then try again")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Every stored page, keyed by URL.
pub type PageIndex = BTreeMap<String, PageRecord>;

/// Handle on a JSON page index stored as a single file.
///
/// Each operation reads the whole document, changes it in memory and writes
/// the whole document back. Only one writer may use a given file at a time.
#[derive(Debug, Clone)]
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file holding an empty index if it does not exist yet.
    /// An existing file is left as it is.
    pub fn initialize(&self) -> Result<()> {

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        file.write_all(b"{}")?;
        file.sync_all()?;
        debug!(path = %self.path.display(), "created empty metadata file");
        Ok(())
    }

    pub fn load(&self) -> Result<PageIndex> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replaces the whole index. The document is written to a sibling file
    /// first and renamed over the store, so readers never see a partial write.
    pub fn save(&self, pages: &PageIndex) -> Result<()> {

        let mut json = serde_json::to_vec_pretty(pages)?;
        json.push(b'\n');

        let tmp_path = self.tmp_path();
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn get(&self, url: &str) -> Result<PageRecord> {
        self.load()?
            .remove(url)
            .ok_or_else(|| StoreError::NotFound(url.to_string()))
    }

    /// Inserts or overwrites the record keyed by `record.site`.
    pub fn put(&self, record: PageRecord) -> Result<()> {
        let mut pages = self.load()?;
        debug!(site = %record.site, "storing page record");
        pages.insert(record.site.clone(), record);
        self.save(&pages)
    }

    /// Sets the record's `last_fetch` to now. See [`MetaStore::touch_at`].
    pub fn touch(&self, url: &str) -> Result<bool> {
        self.touch_at(url, models::now_timestamp())
    }

    /// Updates only `last_fetch` of an existing record. A URL without a
    /// record is left alone and the file is not rewritten.
    ///
    /// Returns whether a record was updated.
    pub fn touch_at(&self, url: &str, last_fetch: String) -> Result<bool> {

        let mut pages = self.load()?;

        let Some(record) = pages.get_mut(url) else {
            debug!(url, "no record to touch");
            return Ok(false);
        };
        record.last_fetch = last_fetch;

        self.save(&pages)?;
        Ok(true)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> MetaStore {
        let store = MetaStore::new(dir.path().join("meta.json"));
        store.initialize().unwrap();
        store
    }

    fn record(site: &str, links: u64, images: u64) -> PageRecord {
        PageRecord::new(site, links, images, "Mon Jan 02 2006 3:4:5 UTC".to_string())
    }

    #[test]
    fn initialize_creates_empty_index() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "{}");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put(record("https://example.com/a", 3, 1)).unwrap();

        store.initialize().unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn initialize_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("nested/data/meta.json"));

        store.initialize().unwrap();

        assert!(store.path().is_file());
    }

    #[test]
    fn get_unknown_url_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.get("https://example.com/missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(url) if url == "https://example.com/missing"));
    }

    #[test]
    fn put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put(record("https://example.com/a", 3, 1)).unwrap();

        let got = store.get("https://example.com/a").unwrap();
        assert_eq!(got.site, "https://example.com/a");
        assert_eq!(got.link_count, 3);
        assert_eq!(got.image_count, 1);
    }

    #[test]
    fn put_overwrites_whole_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put(record("https://example.com/a", 3, 1)).unwrap();
        store.put(PageRecord::new("https://example.com/a", 7, 0, "later".to_string())).unwrap();

        let pages = store.load().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages["https://example.com/a"], PageRecord::new("https://example.com/a", 7, 0, "later".to_string()));
    }

    #[test]
    fn touch_updates_only_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put(record("https://example.com/a", 3, 1)).unwrap();

        let touched = store.touch_at("https://example.com/a", "Tue Jan 03 2006 4:5:6 UTC".to_string()).unwrap();

        assert!(touched);
        let got = store.get("https://example.com/a").unwrap();
        assert_eq!(got, PageRecord::new("https://example.com/a", 3, 1, "Tue Jan 03 2006 4:5:6 UTC".to_string()));
    }

    #[test]
    fn touch_unknown_url_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put(record("https://example.com/a", 3, 1)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let touched = store.touch("https://example.com/unknown").unwrap();

        assert!(!touched);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert!(!store.load().unwrap().contains_key("https://example.com/unknown"));
    }

    #[test]
    fn round_trip_preserves_mapping() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut pages = PageIndex::new();
        store.save(&pages).unwrap();
        assert_eq!(store.load().unwrap(), pages);

        pages.insert("https://example.com/a".to_string(), record("https://example.com/a", 0, 0));
        pages.insert("http://x.test/b?q=1".to_string(), record("http://x.test/b?q=1", 12, 4));
        store.save(&pages).unwrap();

        assert_eq!(store.load().unwrap(), pages);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn reads_compact_documents() {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("meta.json"));
        fs::write(
            store.path(),
            r#"{"http://x.test/a":{"site":"http://x.test/a","num_links":2,"images":1,"last_fetch":"Mon Jan 02 2006 3:4:5 UTC"}}"#,
        ).unwrap();

        let got = store.get("http://x.test/a").unwrap();
        assert_eq!(got, record("http://x.test/a", 2, 1));
    }

    #[test]
    fn corrupt_file_is_not_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("meta.json"));
        fs::write(store.path(), "{\"truncated\": ").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
        assert!(matches!(store.get("http://x.test/a"), Err(StoreError::Corrupt(_))));
        assert!(matches!(store.put(record("http://x.test/a", 1, 1)), Err(StoreError::Corrupt(_))));
        assert!(matches!(store.touch("http://x.test/a"), Err(StoreError::Corrupt(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{\"truncated\": ");
    }

    #[test]
    fn empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("meta.json"));
        fs::write(store.path(), "").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("never-initialized.json"));

        assert!(matches!(store.get("http://x.test/a"), Err(StoreError::Io(_))));
    }

    #[test]
    fn stores_are_independent() {
        let dir = TempDir::new().unwrap();
        let first = MetaStore::new(dir.path().join("first.json"));
        let second = MetaStore::new(dir.path().join("second.json"));
        first.initialize().unwrap();
        second.initialize().unwrap();

        first.put(record("http://x.test/a", 1, 1)).unwrap();

        assert!(first.get("http://x.test/a").is_ok());
        assert!(matches!(second.get("http://x.test/a"), Err(StoreError::NotFound(_))));
    }
}
