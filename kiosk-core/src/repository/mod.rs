pub mod content;

pub use content::{ContentRepository, ContentSnapshot, InMemoryContentRepository};
