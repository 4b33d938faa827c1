pub mod events;
pub mod menu;
pub mod page;
pub mod settings;

pub use events::{ChangeEvent, ChangeKind};
pub use menu::{MenuButton, MenuGroup, MenuNode};
pub use page::{Block, BlockKind, Page};
pub use settings::{AttractConfig, KioskConfig, SettingsUpdate, Theme, ThemeUpdate, WeatherState};
