use crate::icon::{IconResolver, IconTicket, IconTracker, RenderDescriptor};
use crate::menu::{DialogId, MenuController, MenuState, Phase, Surface};
use crate::presenter::Presenter;
use crate::reply_source::ReplySource;
use crate::settings::Settings;
use crate::settings_store::{SettingsPatch, SettingsStore};
use crate::snippet::SnippetRef;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::time::Instant;

/// The whole quick reply component: settings, icon and menu wired to one
/// presenter. Every piece of state is owned by the instance, so several can
/// live side by side.
pub struct QuickMenu {
    store: Mutex<SettingsStore>,
    controller: MenuController,
    presenter: Arc<dyn Presenter>,
    icons: IconTracker,
    initialized: AtomicBool,
}

impl QuickMenu {
    pub fn new(
        store: SettingsStore,
        source: Arc<dyn ReplySource>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(store.settings().enabled));
        let controller = MenuController::new(enabled, source, presenter.clone());
        Self {
            store: Mutex::new(store),
            controller,
            presenter,
            icons: IconTracker::new(),
            initialized: AtomicBool::new(false),
        }
    }

    fn store(&self) -> MutexGuard<'_, SettingsStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Render the initial settings, icon and closed menu. Only the first call
    /// does anything; returns whether it was this one.
    pub fn init(&self) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("quick menu already initialized");
            return false;
        }
        let settings = self.settings();
        self.presenter.on_settings_change(&settings);
        self.render_icon(&settings);
        self.presenter.on_state_change(&MenuState::closed());
        tracing::info!(enabled = settings.enabled, "quick menu initialized");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> Settings {
        self.store().settings().clone()
    }

    pub fn controller(&self) -> &MenuController {
        &self.controller
    }

    pub fn update_settings(&self, patch: SettingsPatch) {
        self.update_settings_at(patch, Instant::now());
    }

    /// Apply `patch` and propagate it: presenter, enable flag and icon.
    pub fn update_settings_at(&self, patch: SettingsPatch, now: Instant) {
        let (before, after) = {
            let mut store = self.store();
            let before = store.settings().clone();
            let after = store.set_at(patch, now).clone();
            (before, after)
        };
        self.presenter.on_settings_change(&after);

        if before.enabled != after.enabled {
            tracing::info!(enabled = after.enabled, "quick menu enable flag changed");
            self.controller.set_enabled(after.enabled);
        }
        if before.icon != after.icon || before.match_host_colors != after.match_host_colors {
            self.render_icon(&after);
        }
    }

    fn render_icon(&self, settings: &Settings) -> IconTicket {
        let descriptor = IconResolver::resolve_settings(settings);
        let ticket = self.icons.apply(descriptor.clone());
        self.presenter.on_icon_change(&descriptor, ticket);
        ticket
    }

    pub fn current_icon(&self) -> Option<RenderDescriptor> {
        self.icons.current()
    }

    /// The presenter could not load the image it was given for `ticket`.
    /// Returns `true` if the error placeholder was rendered.
    pub fn icon_load_failed(&self, ticket: IconTicket, reason: &str) -> bool {
        match self.icons.report_load_failure(ticket, reason) {
            Some(descriptor) => {
                self.presenter.on_icon_change(&descriptor, ticket);
                true
            }
            None => false,
        }
    }

    /// Run the debounced settings write if it is due at `now`. The sink runs
    /// without the store locked.
    pub fn poll(&self, now: Instant) -> bool {
        let Some(write) = self.store().take_due(now) else {
            return false;
        };
        let result = write.run();
        self.store().complete_write(result, now);
        true
    }

    pub fn poll_now(&self) -> bool {
        self.poll(Instant::now())
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        self.store().flush()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn toggle_requested(&self) {
        self.controller.toggle_requested();
    }

    pub fn outside_interaction_detected(&self, target: &[Surface]) -> bool {
        self.controller.outside_interaction_detected(target)
    }

    pub fn item_activated(&self, item: &SnippetRef) {
        self.controller.item_activated(item);
    }

    pub fn spawn_dialog(&self) -> Option<DialogId> {
        self.controller.spawn_dialog()
    }

    pub fn dismiss_dialog(&self, id: DialogId) {
        self.controller.dismiss_dialog(id);
    }
}
