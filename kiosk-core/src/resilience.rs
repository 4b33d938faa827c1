//! Timeouts and size ceilings for calls that leave the process
//!
//! Every network fetch in the kiosk is bounded; nothing blocks indefinitely.

pub mod timeout {
    //! Default timeouts per asset class

    use std::time::Duration;

    /// Config, menu and page fetches
    pub const API_REQUEST: Duration = Duration::from_secs(7);

    /// Images loaded straight into memory
    pub const IMAGE_FETCH: Duration = Duration::from_secs(7);

    /// PDF documents materialised into the cache
    pub const PDF_FETCH: Duration = Duration::from_secs(15);

    /// Generic cached download (video preferred-local path)
    pub const CACHE_FETCH: Duration = Duration::from_secs(20);

    /// Attract/background media downloads
    pub const MEDIA_FETCH: Duration = Duration::from_secs(40);

    /// Third-party weather lookups
    pub const WEATHER_FETCH: Duration = Duration::from_secs(6);
}

pub mod limits {
    //! Download ceilings; the cache truncates at these rather than rejecting

    const MIB: u64 = 1024 * 1024;

    /// Default ceiling for `ensure_media`
    pub const MEDIA_BYTES: u64 = 200 * MIB;

    /// Animated GIF attract assets
    pub const GIF_BYTES: u64 = 50 * MIB;

    /// Theme background images
    pub const BACKGROUND_BYTES: u64 = 15 * MIB;
}
