use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which list a snippet came from. Scoped snippets belong to the current
/// conversation and win label collisions against global ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Scoped,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetRef {
    pub group_name: String,
    pub label: String,
    pub message: String,
    pub origin: Origin,
}

impl SnippetRef {
    pub fn new(group_name: &str, label: &str, message: &str, origin: Origin) -> Self {
        Self {
            group_name: group_name.into(),
            label: label.into(),
            message: message.into(),
            origin,
        }
    }
}

/// Immutable view of the available snippets, captured when the menu opens.
///
/// Labels are unique across both lists: the first occurrence of a label wins,
/// and every scoped entry comes before every global one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSnapshot {
    scoped: Vec<SnippetRef>,
    global: Vec<SnippetRef>,
}

impl ContentSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from raw source lists, dropping label collisions.
    pub fn new(scoped: Vec<SnippetRef>, global: Vec<SnippetRef>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keep = |item: &SnippetRef| seen.insert(item.label.clone());

        let scoped: Vec<SnippetRef> = scoped
            .into_iter()
            .map(|s| SnippetRef { origin: Origin::Scoped, ..s })
            .filter(|s| keep(s))
            .collect();
        let before = global.len();
        let global: Vec<SnippetRef> = global
            .into_iter()
            .map(|s| SnippetRef { origin: Origin::Global, ..s })
            .filter(|s| keep(s))
            .collect();
        let dropped = before - global.len();
        if dropped > 0 {
            tracing::debug!(dropped, "global snippets shadowed by earlier labels");
        }
        Self { scoped, global }
    }

    pub fn scoped(&self) -> &[SnippetRef] {
        &self.scoped
    }

    pub fn global(&self) -> &[SnippetRef] {
        &self.global
    }

    /// Scoped entries followed by the surviving global entries.
    pub fn merged(&self) -> impl Iterator<Item = &SnippetRef> {
        self.scoped.iter().chain(self.global.iter())
    }

    pub fn len(&self) -> usize {
        self.scoped.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, label: &str) -> Option<&SnippetRef> {
        self.merged().find(|s| s.label == label)
    }
}
