//! Download coalescing
//!
//! Concurrent misses for one cache file join a single in-flight download.
//! Joiners share a successful path; when the download fails only the caller
//! that ran it sees the cause, the rest get `CacheError::WorkerFailed`.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use super::media_cache::CacheError;

/// In-flight downloads keyed by cache file name (`<key><ext>`)
#[derive(Clone)]
pub struct DownloadFlights {
    group: Arc<async_singleflight::Group<String, PathBuf, CacheError>>,
}

impl DownloadFlights {
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Run `download` for `file`, or wait on the run already in flight for it
    pub async fn join<F>(&self, file: &str, download: F) -> Result<PathBuf, CacheError>
    where
        F: Future<Output = Result<PathBuf, CacheError>> + Send,
    {
        match self.group.work(file, download).await {
            Ok(path) => Ok(path),
            Err(Some(e)) => Err(e),
            Err(None) => Err(CacheError::WorkerFailed),
        }
    }
}

impl Default for DownloadFlights {
    fn default() -> Self {
        Self::new()
    }
}
