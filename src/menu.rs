use crate::error::QuickMenuError;
use crate::presenter::Presenter;
use crate::reply_source::ReplySource;
use crate::snippet::{ContentSnapshot, SnippetRef};
use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Open,
}

/// Menu state as seen by the presentation layer. `snapshot` is present
/// exactly when the phase is `Open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub phase: Phase,
    pub snapshot: Option<Arc<ContentSnapshot>>,
}

impl MenuState {
    pub fn closed() -> Self {
        Self {
            phase: Phase::Closed,
            snapshot: None,
        }
    }

    fn open(snapshot: Arc<ContentSnapshot>) -> Self {
        Self {
            phase: Phase::Open,
            snapshot: Some(snapshot),
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }
}

/// Identifier of a secondary dialog spawned from inside the open menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(u64);

/// A UI region an interaction target can lie within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Toggle,
    Menu,
    Dialog(DialogId),
    /// Anything owned by the host page.
    Other,
}

enum Stage {
    Closed,
    /// The opening fetch is running.
    Opening { session: u64 },
    Open {
        session: u64,
        snapshot: Arc<ContentSnapshot>,
        dialogs: HashSet<DialogId>,
        triggering: bool,
    },
}

impl Stage {
    fn phase(&self) -> Phase {
        match self {
            Stage::Open { .. } => Phase::Open,
            Stage::Closed | Stage::Opening { .. } => Phase::Closed,
        }
    }
}

/// Visibility state machine for the quick reply menu.
///
/// All transitions take `&self`. The internal lock is never held while the
/// reply source or the presenter runs, so either may call back into the
/// controller.
pub struct MenuController {
    enabled: Arc<AtomicBool>,
    source: Arc<dyn ReplySource>,
    presenter: Arc<dyn Presenter>,
    stage: Mutex<Stage>,
    next_session: AtomicU64,
    next_dialog: AtomicU64,
}

impl MenuController {
    /// `enabled` is the host-provided enable flag; the controller only reads
    /// it, except through [`MenuController::set_enabled`].
    pub fn new(
        enabled: Arc<AtomicBool>,
        source: Arc<dyn ReplySource>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            enabled,
            source,
            presenter,
            stage: Mutex::new(Stage::Closed),
            next_session: AtomicU64::new(0),
            next_dialog: AtomicU64::new(0),
        }
    }

    fn stage(&self) -> MutexGuard<'_, Stage> {
        self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: MenuState, reason: &str) {
        tracing::debug!(to = ?state.phase, reason, "menu phase updated");
        self.presenter.on_state_change(&state);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Update the enable flag. Disabling closes an open menu.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.host_disabled();
        }
    }

    pub fn phase(&self) -> Phase {
        self.stage().phase()
    }

    /// True while the opening fetch is still running.
    pub fn is_opening(&self) -> bool {
        matches!(*self.stage(), Stage::Opening { .. })
    }

    pub fn state(&self) -> MenuState {
        match &*self.stage() {
            Stage::Open { snapshot, .. } => MenuState::open(snapshot.clone()),
            _ => MenuState::closed(),
        }
    }

    fn fetch_snapshot(&self) -> ContentSnapshot {
        if !self.source.is_enabled() {
            let err = QuickMenuError::SourceUnavailable("content source is disabled".into());
            tracing::info!(error = %err, "opening menu without content");
            return ContentSnapshot::empty();
        }
        match self.source.fetch() {
            Ok(content) => ContentSnapshot::new(content.scoped, content.global),
            Err(e) => {
                let err = QuickMenuError::SourceUnavailable(format!("{e:#}"));
                tracing::warn!(error = %err, "opening menu without content");
                ContentSnapshot::empty()
            }
        }
    }

    /// The toggle control was activated.
    pub fn toggle_requested(&self) {
        if !self.is_enabled() {
            tracing::debug!("toggle ignored; menu is disabled");
            return;
        }

        let mut stage = self.stage();
        if matches!(*stage, Stage::Opening { .. }) {
            tracing::debug!("toggle ignored; menu is already opening");
            return;
        }
        if matches!(*stage, Stage::Open { .. }) {
            *stage = Stage::Closed;
            drop(stage);
            self.publish(MenuState::closed(), "toggle");
            return;
        }
        let session = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        *stage = Stage::Opening { session };
        drop(stage);

        let snapshot = Arc::new(self.fetch_snapshot());

        {
            let mut stage = self.stage();
            match *stage {
                Stage::Opening { session: s } if s == session => {}
                _ => {
                    tracing::debug!(session, "open transition superseded; discarding snapshot");
                    return;
                }
            }
            *stage = Stage::Open {
                session,
                snapshot: snapshot.clone(),
                dialogs: HashSet::new(),
                triggering: false,
            };
        }
        tracing::info!(
            scoped = snapshot.scoped().len(),
            global = snapshot.global().len(),
            "quick reply menu opened"
        );
        self.publish(MenuState::open(snapshot), "toggle");
    }

    /// A pointer interaction happened somewhere on the page. `target` is the
    /// target's ancestry, innermost region first.
    ///
    /// Returns `true` if the interaction closed the menu.
    pub fn outside_interaction_detected(&self, target: &[Surface]) -> bool {
        {
            let mut stage = self.stage();
            let Stage::Open { dialogs, .. } = &*stage else {
                return false;
            };
            let inside = target.iter().any(|surface| match surface {
                Surface::Toggle | Surface::Menu => true,
                Surface::Dialog(id) => dialogs.contains(id),
                Surface::Other => false,
            });
            if inside {
                return false;
            }
            *stage = Stage::Closed;
        }
        self.publish(MenuState::closed(), "outside interaction");
        true
    }

    /// Run the activated snippet, then close the menu whatever the outcome.
    pub fn item_activated(&self, item: &SnippetRef) {
        let session = {
            let mut stage = self.stage();
            match &mut *stage {
                Stage::Open {
                    session,
                    triggering,
                    ..
                } => {
                    if *triggering {
                        tracing::debug!(label = %item.label, "activation ignored; a reply is already running");
                        return;
                    }
                    *triggering = true;
                    *session
                }
                _ => {
                    tracing::warn!(label = %item.label, "activation ignored; menu is not open");
                    return;
                }
            }
        };

        if item.group_name.is_empty() || item.label.is_empty() {
            tracing::error!(group = %item.group_name, label = %item.label, "activated item lacks a group or label");
        } else {
            tracing::info!(group = %item.group_name, label = %item.label, "triggering quick reply");
            match self.source.trigger(&item.group_name, &item.label) {
                Ok(()) => {
                    tracing::info!(group = %item.group_name, label = %item.label, "quick reply executed");
                }
                Err(source) => {
                    let err = QuickMenuError::Trigger {
                        group: item.group_name.clone(),
                        label: item.label.clone(),
                        source,
                    };
                    tracing::error!(error = %err, "quick reply failed");
                }
            }
        }

        self.close_session(session, "item activated");
    }

    /// The host switched the component off. Closes an open menu and aborts an
    /// opening one.
    pub fn host_disabled(&self) {
        let was_open = {
            let mut stage = self.stage();
            let was_open = match *stage {
                Stage::Closed => return,
                Stage::Opening { session } => {
                    tracing::debug!(session, "aborting open transition");
                    false
                }
                Stage::Open { .. } => true,
            };
            *stage = Stage::Closed;
            was_open
        };
        if was_open {
            self.publish(MenuState::closed(), "host disabled");
        }
    }

    fn close_session(&self, session: u64, reason: &str) {
        {
            let mut stage = self.stage();
            match *stage {
                Stage::Open { session: s, .. } if s == session => {}
                _ => return,
            }
            *stage = Stage::Closed;
        }
        self.publish(MenuState::closed(), reason);
    }

    /// Register a dialog opened from inside the menu so interactions with it
    /// do not dismiss the menu. Returns `None` unless the menu is open.
    pub fn spawn_dialog(&self) -> Option<DialogId> {
        let mut stage = self.stage();
        let Stage::Open { dialogs, .. } = &mut *stage else {
            return None;
        };
        let id = DialogId(self.next_dialog.fetch_add(1, Ordering::SeqCst) + 1);
        dialogs.insert(id);
        Some(id)
    }

    pub fn dismiss_dialog(&self, id: DialogId) {
        if let Stage::Open { dialogs, .. } = &mut *self.stage() {
            dialogs.remove(&id);
        }
    }
}
