use crate::error::QuickMenuError;
use crate::icon::IconResolver;
use crate::settings::{reconcile, DefaultGlyph, IconKind, Settings};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Coalescing window used unless [`SettingsStore::with_window`] says otherwise.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// Destination of persisted settings.
pub trait SettingsSink: Send + Sync {
    fn persist(&self, settings: &Settings) -> anyhow::Result<()>;
}

/// Writes settings as pretty JSON to a file.
pub struct JsonFileSink {
    path: String,
}

impl JsonFileSink {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SettingsSink for JsonFileSink {
    fn persist(&self, settings: &Settings) -> anyhow::Result<()> {
        tracing::debug!(path = %self.path(), "writing settings file");
        settings.save(self.path())
    }
}

/// Partial update of the icon configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconPatch {
    pub kind: Option<IconKind>,
    /// `Some(None)` clears the content.
    pub content: Option<Option<String>>,
    pub color: Option<String>,
    pub hover_color: Option<String>,
    pub active_color: Option<String>,
    pub size: Option<String>,
    pub glyph: Option<DefaultGlyph>,
}

/// Partial update of [`Settings`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub icon: Option<IconPatch>,
    pub match_host_colors: Option<bool>,
}

impl SettingsPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn match_host_colors(matched: bool) -> Self {
        Self {
            match_host_colors: Some(matched),
            ..Self::default()
        }
    }

    /// Set custom icon content, storing the kind it classifies as.
    pub fn icon_content(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            icon: Some(IconPatch {
                kind: Some(IconResolver::detect_kind(&content)),
                content: Some(Some(content)),
                ..IconPatch::default()
            }),
            ..Self::default()
        }
    }

    /// Go back to the built-in glyph.
    pub fn reset_icon() -> Self {
        Self {
            icon: Some(IconPatch {
                kind: Some(IconKind::Default),
                content: Some(None),
                ..IconPatch::default()
            }),
            ..Self::default()
        }
    }

    fn apply(self, settings: &mut Settings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(matched) = self.match_host_colors {
            settings.match_host_colors = matched;
        }
        let Some(icon) = self.icon else {
            return;
        };
        let target = &mut settings.icon;
        if let Some(kind) = icon.kind {
            target.kind = kind;
        }
        if let Some(content) = icon.content {
            target.content = content;
        }
        if let Some(color) = icon.color {
            target.color = color;
        }
        if let Some(color) = icon.hover_color {
            target.hover_color = color;
        }
        if let Some(color) = icon.active_color {
            target.active_color = color;
        }
        if let Some(size) = icon.size {
            target.size = size;
        }
        if let Some(glyph) = icon.glyph {
            target.glyph = glyph;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Settings) + Send>;

/// A write that is due. Run it without holding the store, then report the
/// outcome with [`SettingsStore::complete_write`].
pub struct PendingWrite {
    sink: Arc<dyn SettingsSink>,
    settings: Settings,
}

impl PendingWrite {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(&self) -> anyhow::Result<()> {
        self.sink.persist(&self.settings)
    }
}

/// Owner of the canonical [`Settings`].
///
/// Mutations go through [`SettingsStore::set`]; subscribers hear about them
/// synchronously while persistence is debounced on the trailing edge: a
/// write happens once no `set` arrived for a full window.
pub struct SettingsStore {
    settings: Settings,
    sink: Arc<dyn SettingsSink>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    window: Duration,
    last_set: Option<Instant>,
    dirty: bool,
    writing: bool,
    writes: usize,
    last_error: Option<QuickMenuError>,
}

impl SettingsStore {
    pub fn new(settings: Settings, sink: Arc<dyn SettingsSink>) -> Self {
        Self {
            settings,
            sink,
            subscribers: Vec::new(),
            next_subscription: 0,
            window: DEFAULT_WINDOW,
            last_set: None,
            dirty: false,
            writing: false,
            writes: 0,
            last_error: None,
        }
    }

    /// Reconcile `persisted` against the defaults and start from the result.
    pub fn load(persisted: &serde_json::Value, sink: Arc<dyn SettingsSink>) -> Self {
        Self::new(reconcile(persisted), sink)
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Settings) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    pub fn set(&mut self, patch: SettingsPatch) -> &Settings {
        self.set_at(patch, Instant::now())
    }

    /// Merge `patch`, notify subscribers and (re)start the coalescing window
    /// at `now`.
    pub fn set_at(&mut self, patch: SettingsPatch, now: Instant) -> &Settings {
        patch.apply(&mut self.settings);
        self.dirty = true;
        self.last_set = Some(now);
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.settings);
        }
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn last_error(&self) -> Option<&QuickMenuError> {
        self.last_error.as_ref()
    }

    /// When the pending write becomes due, if there is one.
    pub fn next_write_at(&self) -> Option<Instant> {
        if !self.dirty {
            return None;
        }
        self.last_set.map(|t| t + self.window)
    }

    fn take_write(&mut self) -> PendingWrite {
        self.dirty = false;
        self.writing = true;
        PendingWrite {
            sink: self.sink.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Hand out the pending write if the window has elapsed at `now` and no
    /// other write is in flight.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingWrite> {
        if self.writing || !self.dirty {
            return None;
        }
        let last_set = self.last_set?;
        if now.saturating_duration_since(last_set) < self.window {
            return None;
        }
        Some(self.take_write())
    }

    /// Record the outcome of a write handed out by [`SettingsStore::take_due`].
    /// A failed write keeps the store dirty and is retried after another
    /// full window.
    pub fn complete_write(&mut self, result: anyhow::Result<()>, now: Instant) {
        self.writing = false;
        match result {
            Ok(()) => {
                self.writes += 1;
                self.last_error = None;
                tracing::debug!(writes = self.writes, "settings persisted");
            }
            Err(e) => {
                let err = QuickMenuError::Persistence(e);
                tracing::error!(error = %err, "keeping in-memory settings");
                self.last_error = Some(err);
                self.dirty = true;
                let rearm = self.last_set.map_or(now, |t| t.max(now));
                self.last_set = Some(rearm);
            }
        }
    }

    /// Run the pending write if it is due. Returns `true` if a write ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(write) = self.take_due(now) else {
            return false;
        };
        let result = write.run();
        self.complete_write(result, now);
        true
    }

    pub fn poll_now(&mut self) -> bool {
        self.poll(Instant::now())
    }

    /// Write immediately if anything is pending, ignoring the window.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        if self.writing || !self.dirty {
            return Ok(());
        }
        let write = self.take_write();
        match write.run() {
            Ok(()) => {
                self.complete_write(Ok(()), Instant::now());
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                self.complete_write(Err(e), Instant::now());
                anyhow::bail!(message)
            }
        }
    }
}
