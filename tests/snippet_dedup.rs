use quick_reply_menu::snippet::{ContentSnapshot, Origin, SnippetRef};

fn scoped(group: &str, label: &str) -> SnippetRef {
    SnippetRef::new(group, label, &format!("{group}:{label}"), Origin::Scoped)
}

fn global(group: &str, label: &str) -> SnippetRef {
    SnippetRef::new(group, label, &format!("{group}:{label}"), Origin::Global)
}

#[test]
fn scoped_label_shadows_global() {
    let snapshot = ContentSnapshot::new(
        vec![scoped("Chat", "hi"), scoped("Chat", "bye")],
        vec![global("Common", "hi"), global("Common", "thanks")],
    );
    let labels: Vec<&str> = snapshot.merged().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["hi", "bye", "thanks"]);
    assert_eq!(snapshot.find("hi").unwrap().group_name, "Chat");
    assert_eq!(snapshot.find("hi").unwrap().origin, Origin::Scoped);
    assert_eq!(snapshot.global().len(), 1);
    assert_eq!(snapshot.len(), 3);
}

#[test]
fn first_occurrence_wins_within_a_list() {
    let snapshot = ContentSnapshot::new(
        vec![scoped("A", "x"), scoped("B", "x")],
        vec![global("C", "y"), global("D", "y")],
    );
    assert_eq!(snapshot.scoped().len(), 1);
    assert_eq!(snapshot.scoped()[0].group_name, "A");
    assert_eq!(snapshot.global().len(), 1);
    assert_eq!(snapshot.global()[0].group_name, "C");
}

#[test]
fn origin_follows_the_list() {
    let snapshot = ContentSnapshot::new(vec![global("A", "x")], vec![scoped("B", "y")]);
    assert_eq!(snapshot.scoped()[0].origin, Origin::Scoped);
    assert_eq!(snapshot.global()[0].origin, Origin::Global);
}

#[test]
fn empty_snapshot() {
    let snapshot = ContentSnapshot::empty();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.merged().count(), 0);
    assert!(snapshot.find("anything").is_none());
}
