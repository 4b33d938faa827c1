use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extension used when the URL path has none or an implausible one
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Longest accepted extension, not counting the dot
const MAX_EXTENSION_LEN: usize = 4;

/// Content-addressed file stem for a resolved URL
#[must_use]
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Lower-cased extension (with leading dot) of the URL's path component
#[must_use]
pub fn extension_for(url: &str) -> String {
    let path = url::Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_string(),
        |parsed| parsed.path().to_string(),
    );
    let file_name = path.rsplit('/').next().unwrap_or_default();

    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// A valid cached file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
    pub extension: String,
}

impl CacheEntry {
    /// Path a URL maps to under `cache_dir`
    #[must_use]
    pub fn path_for(cache_dir: &Path, key: &str, extension: &str) -> PathBuf {
        cache_dir.join(format!("{key}{extension}"))
    }

    /// Look up the entry for `key`; missing or zero-length files count as absent
    pub async fn lookup(cache_dir: &Path, key: &str, extension: &str) -> Option<Self> {
        let local_path = Self::path_for(cache_dir, key, extension);
        let metadata = tokio::fs::metadata(&local_path).await.ok()?;
        if !metadata.is_file() || metadata.len() == 0 {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            local_path,
            size_bytes: metadata.len(),
            extension: extension.to_string(),
        })
    }
}
