//! Media call sites used by the renderer
//!
//! Each asset class has its own fetch policy: images are loaded straight into
//! memory, PDFs and GIFs are materialised in the cache, videos prefer a cached
//! copy but can always fall back to streaming.

use bytes::Bytes;
use kiosk_core::cache::{FetchOptions, MediaCache};
use kiosk_core::models::{Block, BlockKind};
use kiosk_core::resilience::{limits, timeout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::idle::{AttractKind, AttractMedia};

/// Where a video player should read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Local(PathBuf),
    /// Remote URL, played without a local copy
    Stream(String),
}

/// Ready-to-render media for a page block
#[derive(Debug, Clone)]
pub enum BlockMedia {
    Image(Bytes),
    Video(VideoSource),
    Pdf(PathBuf),
    Unavailable,
}

#[derive(Clone)]
pub struct MediaClient {
    cache: MediaCache,
}

impl MediaClient {
    #[must_use]
    pub const fn new(cache: MediaCache) -> Self {
        Self { cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Image bytes; remote images bypass the on-disk cache
    pub async fn load_image(&self, reference: &str) -> Option<Bytes> {
        let url = self.cache.resolve(reference.trim());
        if url.is_empty() {
            return None;
        }

        if MediaCache::is_remote(&url) {
            return self
                .cache
                .fetch_bytes(&url, timeout::IMAGE_FETCH)
                .await
                .map_err(|e| warn!(url = %url, error = %e, "Image fetch failed"))
                .ok();
        }

        let path = self.cache.get(&url, FetchOptions::default()).await?;
        match tokio::fs::read(&path).await {
            Ok(data) if !data.is_empty() => Some(Bytes::from(data)),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image read failed");
                None
            }
        }
    }

    /// Local PDF file, downloading into the cache with a `.pdf` name when remote
    pub async fn ensure_pdf(&self, reference: &str) -> Option<PathBuf> {
        self.cache
            .get(
                reference,
                FetchOptions::default()
                    .with_timeout(timeout::PDF_FETCH)
                    .with_extension(".pdf"),
            )
            .await
    }

    /// Cached local copy when possible, otherwise the remote URL
    pub async fn video_source(&self, reference: &str) -> Option<VideoSource> {
        let url = self.cache.resolve(reference.trim());
        if url.is_empty() {
            return None;
        }

        match self
            .cache
            .get(&url, FetchOptions::default().with_timeout(timeout::CACHE_FETCH))
            .await
        {
            Some(path) => Some(VideoSource::Local(path)),
            None if MediaCache::is_remote(&url) => {
                debug!(url = %url, "Video not cached, streaming instead");
                Some(VideoSource::Stream(url))
            }
            None => None,
        }
    }

    /// Generic materialisation with a size ceiling and timeout
    pub async fn ensure_media(
        &self,
        reference: &str,
        limit_bytes: Option<u64>,
        fetch_timeout: Option<Duration>,
    ) -> Option<PathBuf> {
        self.cache
            .get(
                reference,
                FetchOptions::default()
                    .with_limit(limit_bytes.unwrap_or(limits::MEDIA_BYTES))
                    .with_timeout(fetch_timeout.unwrap_or(timeout::MEDIA_FETCH)),
            )
            .await
    }

    /// Theme background image
    pub async fn ensure_background(&self, reference: &str) -> Option<PathBuf> {
        self.ensure_media(reference, Some(limits::BACKGROUND_BYTES), None)
            .await
    }

    /// Load an attract-mode asset according to its kind
    pub async fn prepare_attract(&self, asset: &str, kind: AttractKind) -> Option<AttractMedia> {
        let media = match kind {
            AttractKind::Image => AttractMedia::Image {
                asset: asset.to_string(),
                data: self.load_image(asset).await?,
            },
            AttractKind::Gif => AttractMedia::Gif {
                asset: asset.to_string(),
                path: self
                    .ensure_media(asset, Some(limits::GIF_BYTES), None)
                    .await?,
            },
            AttractKind::Video => AttractMedia::Video {
                asset: asset.to_string(),
                source: self.video_source(asset).await?,
            },
        };
        Some(media)
    }

    /// Media for one page block; text blocks need nothing
    pub async fn prepare_block(&self, block: &Block) -> Option<BlockMedia> {
        let reference = match block.kind {
            BlockKind::Text => return None,
            _ => block.media_path(),
        };
        let Some(reference) = reference else {
            return Some(BlockMedia::Unavailable);
        };

        let media = match block.kind {
            BlockKind::Image => self.load_image(reference).await.map(BlockMedia::Image),
            BlockKind::Video => self.video_source(reference).await.map(BlockMedia::Video),
            BlockKind::Pdf => self.ensure_pdf(reference).await.map(BlockMedia::Pdf),
            BlockKind::Text => None,
        };
        Some(media.unwrap_or(BlockMedia::Unavailable))
    }
}
