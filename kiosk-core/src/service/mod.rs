pub mod broadcaster;
pub mod content;

pub use broadcaster::{ChangeBroadcaster, Subscription, SubscriptionId, DEFAULT_MAILBOX_CAPACITY};
pub use content::ContentService;
