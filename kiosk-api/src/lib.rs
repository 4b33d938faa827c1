// Kiosk API Library
//
// HTTP surface of the content server: change stream, content reads and admin
// mutations

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
