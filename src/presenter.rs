use crate::icon::{IconTicket, RenderDescriptor};
use crate::menu::MenuState;
use crate::settings::Settings;

/// Presentation adapter. The core decides what is shown; implementors own the
/// concrete rendering.
///
/// Callbacks run synchronously on the caller's thread and may call back into
/// the controller.
pub trait Presenter: Send + Sync {
    /// Fired on every menu phase transition.
    fn on_state_change(&self, _state: &MenuState) {}
    /// Fired whenever a new icon descriptor has to be rendered. Report a
    /// failed image load with `ticket`.
    fn on_icon_change(&self, _descriptor: &RenderDescriptor, _ticket: IconTicket) {}
    /// Fired on every committed settings mutation.
    fn on_settings_change(&self, _settings: &Settings) {}
}

/// Presenter that renders nothing.
pub struct NullPresenter;

impl Presenter for NullPresenter {}
