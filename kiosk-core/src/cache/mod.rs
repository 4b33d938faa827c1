//! Local media cache
//!
//! Remote media references map to content-addressed files under the cache
//! directory; concurrent misses for one file share a single download.

pub mod key;
pub mod media_cache;
pub mod singleflight;

pub use key::{cache_key, extension_for, CacheEntry};
pub use media_cache::{CacheError, FetchOptions, MediaCache};
pub use singleflight::DownloadFlights;
