pub mod models;
pub mod repository;
pub mod service;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod bootstrap;
pub mod resilience;

pub use config::Config;
pub use error::{Error, Result};
pub use cache::{FetchOptions, MediaCache};
pub use models::{ChangeEvent, ChangeKind};
