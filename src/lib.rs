pub mod error;
pub mod icon;
pub mod logging;
pub mod menu;
pub mod presenter;
pub mod quick_menu;
pub mod reply_source;
pub mod settings;
pub mod settings_store;
pub mod snippet;

pub use error::QuickMenuError;
pub use icon::{IconResolver, RenderDescriptor, RenderKind};
pub use menu::{MenuController, MenuState, Phase, Surface};
pub use quick_menu::QuickMenu;
pub use settings::Settings;
pub use settings_store::{SettingsPatch, SettingsStore};
