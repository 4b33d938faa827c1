use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::key::{cache_key, extension_for, CacheEntry};
use super::singleflight::DownloadFlights;
use crate::config::MediaCacheConfig;
use crate::resilience::timeout;

/// Media cache errors
///
/// Cloneable so a single download outcome can be shared by every caller
/// coalesced onto it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Empty response body")]
    EmptyBody,

    #[error("Download worker failed")]
    WorkerFailed,
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Per-call download knobs
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Bytes kept before the download is cut short
    pub limit_bytes: Option<u64>,
    /// Whole-request timeout; the cache default applies when unset
    pub timeout: Option<Duration>,
    /// Forced file extension (with leading dot), e.g. `.pdf`
    pub extension: Option<&'static str>,
}

impl FetchOptions {
    #[must_use]
    pub const fn with_limit(mut self, limit_bytes: u64) -> Self {
        self.limit_bytes = Some(limit_bytes);
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_extension(mut self, extension: &'static str) -> Self {
        self.extension = Some(extension);
        self
    }
}

/// Content-addressed on-disk cache for remote media
///
/// Relative references resolve against the content server's base URL. Local
/// filesystem paths pass through untouched. A cache file is only ever visible
/// once complete: downloads land in a `.part` file that is renamed into place.
#[derive(Clone)]
pub struct MediaCache {
    client: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
    default_timeout: Duration,
    flights: DownloadFlights,
}

impl MediaCache {
    /// Build a cache with its own HTTP client, creating the directory if needed
    pub fn new(config: &MediaCacheConfig, base_url: &str) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_client(client, base_url, config.cache_dir())
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        debug!(cache_dir = %cache_dir.display(), "Media cache directory ready");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir,
            default_timeout: timeout::CACHE_FETCH,
            flights: DownloadFlights::new(),
        })
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Turn a media reference into a fetchable URL or local path
    ///
    /// `/media/a.png` becomes `<base>/media/a.png`; absolute URLs, local paths
    /// and the empty string are returned as-is.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("/media/") {
            format!("{}{}", self.base_url, reference)
        } else {
            reference.to_string()
        }
    }

    #[must_use]
    pub fn is_remote(url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// File a resolved URL is stored under
    #[must_use]
    pub fn cache_path(&self, url: &str, extension: Option<&str>) -> PathBuf {
        let extension = extension.map_or_else(|| extension_for(url), str::to_string);
        CacheEntry::path_for(&self.cache_dir, &cache_key(url), &extension)
    }

    /// Local path for `reference`, downloading it on a miss
    ///
    /// Returns `None` for an empty reference or any network/IO failure; the
    /// failure is logged and no partial file is left behind.
    pub async fn get(&self, reference: &str, options: FetchOptions) -> Option<PathBuf> {
        let url = self.resolve(reference.trim());
        if url.is_empty() {
            return None;
        }

        if !Self::is_remote(&url) {
            return Some(local_path(&url));
        }

        match self.cached_or_fetch(&url, &options).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(url = %url, error = %e, "Media download failed");
                None
            }
        }
    }

    /// Fetch a resource straight into memory without touching the cache
    pub async fn fetch_bytes(&self, reference: &str, timeout: Duration) -> Result<Bytes, CacheError> {
        let url = self.resolve(reference.trim());
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(CacheError::EmptyBody);
        }
        Ok(body)
    }

    async fn cached_or_fetch(&self, url: &str, options: &FetchOptions) -> Result<PathBuf, CacheError> {
        let extension = options
            .extension
            .map_or_else(|| extension_for(url), str::to_string);
        let key = cache_key(url);

        if let Some(entry) = CacheEntry::lookup(&self.cache_dir, &key, &extension).await {
            debug!(url = %url, path = %entry.local_path.display(), "Media cache hit");
            return Ok(entry.local_path);
        }

        let target = CacheEntry::path_for(&self.cache_dir, &key, &extension);
        let flight_key = format!("{key}{extension}");

        self.flights
            .join(&flight_key, async {
                // A previous leader may have finished between our lookup and now
                if let Some(entry) = CacheEntry::lookup(&self.cache_dir, &key, &extension).await {
                    return Ok(entry.local_path);
                }
                self.download(url, &target, options).await
            })
            .await
    }

    async fn download(
        &self,
        url: &str,
        target: &Path,
        options: &FetchOptions,
    ) -> Result<PathBuf, CacheError> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = target.with_file_name(format!("{file_name}.{}.part", nanoid::nanoid!(8)));

        let result = self.write_part(url, &part, options).await;
        match result {
            Ok(written) => {
                if let Err(e) = tokio::fs::rename(&part, target).await {
                    let _ = tokio::fs::remove_file(&part).await;
                    return Err(e.into());
                }
                info!(
                    url = %url,
                    path = %target.display(),
                    bytes = written,
                    "Media cached"
                );
                Ok(target.to_path_buf())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    /// Stream the body into `part`, stopping exactly at the size ceiling
    async fn write_part(
        &self,
        url: &str,
        part: &Path,
        options: &FetchOptions,
    ) -> Result<u64, CacheError> {
        let mut response = self
            .client
            .get(url)
            .timeout(options.timeout.unwrap_or(self.default_timeout))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CacheError::Status(response.status().as_u16()));
        }

        let mut file = tokio::fs::File::create(part).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            let take = match options.limit_bytes {
                Some(limit) => {
                    let room = limit.saturating_sub(written);
                    usize::try_from(room).map_or(chunk.len(), |room| room.min(chunk.len()))
                }
                None => chunk.len(),
            };
            file.write_all(&chunk[..take]).await?;
            written += take as u64;

            if options.limit_bytes.is_some_and(|limit| written >= limit) {
                debug!(url = %url, limit = written, "Download truncated at size ceiling");
                break;
            }
        }

        file.flush().await?;
        drop(file);

        if written == 0 {
            return Err(CacheError::EmptyBody);
        }
        Ok(written)
    }
}

/// Normalise a local path reference, accepting `file://` URLs
fn local_path(reference: &str) -> PathBuf {
    if let Ok(url) = url::Url::parse(reference) {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return path;
            }
        }
    }
    PathBuf::from(reference.replace('\\', "/"))
}
