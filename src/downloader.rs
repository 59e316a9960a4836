use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use url::Url;
use crate::fetcher::{self, Fetch, FetchError};
use crate::models::{self, PageRecord};
use crate::scanner::{self, ScanError};
use crate::store::{MetaStore, StoreError};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid url format: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported scheme {scheme:?} in {url}, expected http or https")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("download error for {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("page parse error for {url}")]
    Scan {
        url: String,
        #[source]
        source: ScanError,
    },
    #[error("metadata store error")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Parses `raw` as an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<Url> {

    let url = Url::parse(raw).map_err(|source| DownloadError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DownloadError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Fetched, scanned and recorded by this call.
    Fetched,
    /// Local copy already present, only the timestamp was refreshed.
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub fetched: usize,
    pub already_present: usize,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.fetched + self.already_present
    }
}

type Clock = Box<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Downloads each page once and refreshes its `last_fetch` on every request.
pub struct Downloader<F> {
    fetcher: F,
    store: MetaStore,
    output_dir: PathBuf,
    clock: Clock,
}

impl<F: Fetch> Downloader<F> {

    pub fn new(fetcher: F, store: MetaStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            store,
            output_dir: output_dir.into(),
            clock: Box::new(OffsetDateTime::now_utc),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> OffsetDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &MetaStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn page_path(&self, url: &Url) -> PathBuf {
        self.output_dir.join(fetcher::derived_filename(url))
    }

    /// Processes `urls` in order. The first error aborts the rest of the
    /// batch; records committed before it stay in the store.
    pub async fn download_pages(&self, urls: &[Url]) -> Result<DownloadSummary> {

        let mut summary = DownloadSummary::default();

        for url in urls {
            match self.download_page(url).await? {
                PageStatus::Fetched => summary.fetched += 1,
                PageStatus::AlreadyPresent => summary.already_present += 1,
            }
        }

        Ok(summary)
    }

    pub async fn download_page(&self, url: &Url) -> Result<PageStatus> {

        let site = url.as_str();
        let path = self.page_path(url);

        let status = if path.exists() {
            PageStatus::AlreadyPresent
        } else {
            fetcher::download_to(&self.fetcher, url, &path)
                .await
                .map_err(|source| DownloadError::Fetch { url: site.to_string(), source })?;

            let counts = scanner::scan_file(&path)
                .map_err(|source| DownloadError::Scan { url: site.to_string(), source })?;

            self.store.put(PageRecord::new(site, counts.link_count, counts.image_count, self.now()))?;
            info!(url = site, links = counts.link_count, images = counts.image_count, "page recorded");
            PageStatus::Fetched
        };

        let touched = self.store.touch_at(site, self.now())?;
        if !touched {
            warn!(
                url = site,
                path = %path.display(),
                "local file exists but no metadata is recorded for this url, remove the file to fetch it again"
            );
        }

        Ok(status)
    }

    fn now(&self) -> String {
        models::fetch_timestamp((self.clock)())
    }
}
