use std::{fs, thread::sleep, time::Duration};

use quick_reply_menu::icon::{IconResolver, RenderKind};
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn icon_diagnostics_reach_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quick_menu.log");

    quick_reply_menu::logging::init(true, Some(path.clone()));
    let kind = IconResolver::classify(Some("not-an-icon"));
    assert!(matches!(kind, RenderKind::Unknown { .. }));

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("icon content degraded to fallback"));
    assert!(contents.contains("icon configuration rejected"));
    assert!(contents.contains("WARN"));
}
