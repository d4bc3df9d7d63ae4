use quick_reply_menu::settings::{IconKind, Settings};
use quick_reply_menu::settings_store::{
    IconPatch, JsonFileSink, SettingsPatch, SettingsSink, SettingsStore, DEFAULT_WINDOW,
};
use quick_reply_menu::QuickMenuError;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::tempdir;

const WINDOW: Duration = Duration::from_millis(500);

#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<Settings>>,
    fail: AtomicBool,
}

impl RecordingSink {
    fn writes(&self) -> Vec<Settings> {
        self.writes.lock().unwrap().clone()
    }
}

impl SettingsSink for RecordingSink {
    fn persist(&self, settings: &Settings) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.writes.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

fn store() -> (SettingsStore, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let store = SettingsStore::new(Settings::default(), sink.clone()).with_window(WINDOW);
    (store, sink)
}

fn size_patch(size: &str) -> SettingsPatch {
    SettingsPatch {
        icon: Some(IconPatch {
            size: Some(size.into()),
            ..IconPatch::default()
        }),
        ..SettingsPatch::default()
    }
}

#[test]
fn default_window_is_half_a_second() {
    let store = SettingsStore::new(Settings::default(), Arc::new(RecordingSink::default()));
    assert_eq!(store.window(), DEFAULT_WINDOW);
    assert_eq!(DEFAULT_WINDOW, Duration::from_millis(500));
}

#[test]
fn five_sets_in_window_give_one_write_of_last_value() {
    let (mut store, sink) = store();
    let t0 = Instant::now();
    for i in 0..5u64 {
        let now = t0 + Duration::from_millis(i * 50);
        store.set_at(size_patch(&format!("{i}em")), now);
        assert!(!store.poll(now));
    }
    let last_set = t0 + Duration::from_millis(200);
    assert!(!store.poll(last_set + WINDOW - Duration::from_millis(1)));
    assert!(store.poll(last_set + WINDOW));
    assert!(!store.poll(last_set + WINDOW * 4));

    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].icon.size, "4em");
    assert_eq!(store.write_count(), 1);
    assert!(!store.is_dirty());
}

#[test]
fn each_set_resets_the_timer() {
    let (mut store, sink) = store();
    let t0 = Instant::now();
    store.set_at(SettingsPatch::enabled(false), t0);
    let t1 = t0 + Duration::from_millis(400);
    store.set_at(SettingsPatch::enabled(true), t1);

    // Due for the first set, but the second one restarted the window.
    assert!(!store.poll(t0 + WINDOW));
    assert_eq!(store.next_write_at(), Some(t1 + WINDOW));
    assert!(store.poll(t1 + WINDOW));
    assert_eq!(sink.writes().len(), 1);
    assert!(sink.writes()[0].enabled);
}

#[test]
fn no_write_without_set() {
    let (mut store, sink) = store();
    assert!(!store.poll(Instant::now() + WINDOW * 10));
    assert!(sink.writes().is_empty());
    assert_eq!(store.next_write_at(), None);
}

#[test]
fn subscribers_receive_every_merged_snapshot() {
    let (mut store, _sink) = store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let id = store.subscribe(move |s: &Settings| seen_clone.lock().unwrap().push(s.clone()));

    store.set(SettingsPatch::enabled(false));
    store.set(SettingsPatch::match_host_colors(false));

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].enabled);
        assert!(seen[0].match_host_colors);
        assert!(!seen[1].enabled);
        assert!(!seen[1].match_host_colors);
    }

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.set(SettingsPatch::enabled(true));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn empty_patch_still_notifies_and_schedules() {
    let (mut store, sink) = store();
    let count = Arc::new(Mutex::new(0));
    let count_clone = count.clone();
    store.subscribe(move |_| *count_clone.lock().unwrap() += 1);

    let t0 = Instant::now();
    store.set_at(SettingsPatch::default(), t0);
    assert_eq!(*count.lock().unwrap(), 1);
    assert!(store.is_dirty());
    assert!(store.poll(t0 + WINDOW));
    assert_eq!(sink.writes().len(), 1);
}

#[test]
fn icon_patch_can_clear_content() {
    let (mut store, _sink) = store();
    store.set(SettingsPatch::icon_content("https://x.test/a.png"));
    assert_eq!(store.settings().icon.kind, IconKind::Reference);
    assert_eq!(
        store.settings().icon.content.as_deref(),
        Some("https://x.test/a.png")
    );

    store.set(SettingsPatch::reset_icon());
    assert_eq!(store.settings().icon.kind, IconKind::Default);
    assert_eq!(store.settings().icon.content, None);
}

#[test]
fn icon_content_stores_classified_kind() {
    let (mut store, _sink) = store();
    store.set(SettingsPatch::icon_content("<svg><rect/></svg>"));
    assert_eq!(store.settings().icon.kind, IconKind::Vector);

    store.set(SettingsPatch::icon_content("iVBORw0KGgoAAAANSUhEUg"));
    assert_eq!(store.settings().icon.kind, IconKind::EmbeddedImage);

    store.set(SettingsPatch::icon_content("not-an-icon"));
    assert_eq!(store.settings().icon.kind, IconKind::Unknown);
}

#[test]
fn failed_write_keeps_settings_and_retries_after_window() {
    let (mut store, sink) = store();
    sink.fail.store(true, Ordering::SeqCst);
    let t0 = Instant::now();
    store.set_at(SettingsPatch::enabled(false), t0);

    let failed_at = t0 + WINDOW;
    assert!(store.poll(failed_at));
    assert!(store.is_dirty());
    assert!(matches!(
        store.last_error(),
        Some(QuickMenuError::Persistence(_))
    ));
    assert!(!store.settings().enabled);
    assert_eq!(store.write_count(), 0);

    sink.fail.store(false, Ordering::SeqCst);
    assert!(!store.poll(failed_at + WINDOW / 2));
    assert!(store.poll(failed_at + WINDOW));
    assert!(store.last_error().is_none());
    assert_eq!(sink.writes().len(), 1);
    assert!(!sink.writes()[0].enabled);
}

#[test]
fn writes_are_serialized() {
    let (mut store, sink) = store();
    let t0 = Instant::now();
    store.set_at(SettingsPatch::enabled(false), t0);

    let pending = store.take_due(t0 + WINDOW).expect("write due");
    assert!(store.take_due(t0 + WINDOW).is_none());

    // A set arriving while the write runs lands in the next one.
    let during = t0 + WINDOW + Duration::from_millis(10);
    store.set_at(SettingsPatch::match_host_colors(false), during);
    assert!(store.take_due(during + WINDOW).is_none());

    let result = pending.run();
    store.complete_write(result, during);
    assert!(store.is_dirty());
    assert!(store.poll(during + WINDOW));

    let writes = sink.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes[0].match_host_colors);
    assert!(!writes[1].match_host_colors);
}

#[test]
fn flush_writes_immediately() {
    let (mut store, sink) = store();
    store.set(SettingsPatch::enabled(false));
    store.flush().unwrap();
    assert_eq!(sink.writes().len(), 1);
    assert!(!store.is_dirty());

    // Nothing pending: no extra write.
    store.flush().unwrap();
    assert_eq!(sink.writes().len(), 1);
}

#[test]
fn flush_reports_failure() {
    let (mut store, sink) = store();
    sink.fail.store(true, Ordering::SeqCst);
    store.set(SettingsPatch::enabled(false));
    assert!(store.flush().is_err());
    assert!(store.is_dirty());
}

#[test]
fn json_file_sink_persists_reconcilable_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quick_menu.json");
    let sink = Arc::new(JsonFileSink::new(path.to_str().unwrap()));
    assert_eq!(sink.path(), path.to_str().unwrap());

    let persisted = json!({ "iconType": "star" });
    let mut store = SettingsStore::load(&persisted, sink).with_window(WINDOW);
    let t0 = Instant::now();
    store.set_at(SettingsPatch::enabled(false), t0);
    assert!(!path.exists());
    assert!(store.poll(t0 + WINDOW));

    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(&loaded, store.settings());
    assert!(!loaded.enabled);
}
