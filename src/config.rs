use std::path::PathBuf;
use std::time::Duration;
use crate::downloader::Downloader;
use crate::fetcher::{self, HttpFetcher};
use crate::store::MetaStore;

/// Where pages and metadata live, and how pages are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON page index, `meta.json` in the working directory by default.
    pub store_path: PathBuf,
    /// Directory downloaded pages are written to.
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub const STORE_FILE: &'static str = "meta.json";
    pub const TIMEOUT_SECS: u64 = 30;

    pub fn store(&self) -> MetaStore {
        MetaStore::new(&self.store_path)
    }

    pub fn fetcher(&self) -> fetcher::Result<HttpFetcher> {
        HttpFetcher::new(&self.user_agent, self.timeout)
    }

    pub fn downloader(&self) -> fetcher::Result<Downloader<HttpFetcher>> {
        Ok(Downloader::new(self.fetcher()?, self.store(), &self.output_dir))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(Self::STORE_FILE),
            output_dir: PathBuf::from("."),
            timeout: Duration::from_secs(Self::TIMEOUT_SECS),
            user_agent: HttpFetcher::USER_AGENT.to_string(),
        }
    }
}
