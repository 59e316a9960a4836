use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error")]
    Network(#[from] reqwest::Error),
    #[error("I/O error while saving page")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Retrieves the raw body of a page.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// [`Fetch`] over HTTP. The response status is not checked: whatever body the
/// server answers with, error pages included, is returned as given.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {

    pub const USER_AGENT: &'static str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {

        let response = self.client
            .get(url.clone())
            .send()
            .await?;

        debug!(%url, status = %response.status(), "response received");

        Ok(response.bytes().await?.to_vec())
    }
}

/// Local file name for `url`: the last path segment plus `.html`.
///
/// Falls back to the host, then to `index`, when the path has no segment.
/// Distinct URLs sharing a last segment map to the same name.
pub fn derived_filename(url: &Url) -> String {

    let base = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .or_else(|| url.host_str())
        .unwrap_or("index");

    let base: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    format!("{}.html", base)
}

/// Fetches `url` and writes the body verbatim to `path`.
pub async fn download_to<F: Fetch>(fetcher: &F, url: &Url, path: &Path) -> Result<()> {

    info!(%url, "downloading");
    let bytes = fetcher.fetch(url).await?;

    if let Err(e) = std::fs::write(path, &bytes) {
        // a truncated page would be mistaken for a complete download later
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "page saved");
    Ok(())
}
