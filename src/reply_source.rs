use crate::snippet::{Origin, SnippetRef};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Snippets offered by a [`ReplySource`], before label de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceContent {
    pub scoped: Vec<SnippetRef>,
    pub global: Vec<SnippetRef>,
}

/// Supplier and executor of quick reply snippets.
pub trait ReplySource: Send + Sync {
    /// Whether the host's own quick reply feature is switched on. A disabled
    /// source is never fetched from.
    fn is_enabled(&self) -> bool {
        true
    }
    /// Return the visible snippets. Hidden entries must already be removed.
    fn fetch(&self) -> anyhow::Result<SourceContent>;
    /// Execute the snippet identified by `group` and `label`.
    fn trigger(&self, group: &str, label: &str) -> anyhow::Result<()>;
}

pub const LIBRARY_FILE: &str = "quick_replies.json";

const UNKNOWN_SET: &str = "Unknown Set";
const EMPTY_MESSAGE: &str = "(no message)";

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ReplyEntry {
    pub label: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ReplySet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<ReplyEntry>,
}

/// A set attached to either the chat or the global list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SetLink {
    #[serde(default = "default_true")]
    pub visible: bool,
    pub set: ReplySet,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplyLibrary {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sets attached to the current chat.
    #[serde(default)]
    pub chat: Vec<SetLink>,
    #[serde(default)]
    pub global: Vec<SetLink>,
}

impl Default for ReplyLibrary {
    fn default() -> Self {
        Self {
            enabled: true,
            chat: Vec::new(),
            global: Vec::new(),
        }
    }
}

/// Load the reply library from the JSON file at `path`.
pub fn load_library(path: &str) -> anyhow::Result<ReplyLibrary> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    if content.trim().is_empty() {
        return Ok(ReplyLibrary::default());
    }
    let library: ReplyLibrary = serde_json::from_str(&content)?;
    Ok(library)
}

/// Persist `library` to `path`.
pub fn save_library(path: &str, library: &ReplyLibrary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(library)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn set_name(set: &ReplySet) -> &str {
    if set.name.trim().is_empty() {
        UNKNOWN_SET
    } else {
        &set.name
    }
}

fn collect(links: &[SetLink], origin: Origin) -> Vec<SnippetRef> {
    links
        .iter()
        .filter(|link| link.visible)
        .flat_map(|link| {
            let group = set_name(&link.set);
            link.set
                .entries
                .iter()
                .filter(|e| !e.hidden && !e.label.is_empty())
                .map(move |e| {
                    let message = if e.message.is_empty() {
                        EMPTY_MESSAGE
                    } else {
                        e.message.as_str()
                    };
                    SnippetRef::new(group, &e.label, message, origin)
                })
        })
        .collect()
}

/// Runs the message of a triggered snippet, e.g. by sending it to the chat.
pub type Executor = Box<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// [`ReplySource`] backed by an in-memory [`ReplyLibrary`].
pub struct QuickReplyLibrary {
    library: RwLock<ReplyLibrary>,
    executor: Executor,
}

impl QuickReplyLibrary {
    pub fn new(library: ReplyLibrary, executor: Executor) -> Self {
        Self {
            library: RwLock::new(library),
            executor,
        }
    }

    pub fn from_file(path: &str, executor: Executor) -> anyhow::Result<Self> {
        Ok(Self::new(load_library(path)?, executor))
    }

    /// Replace the library contents. An open menu keeps showing the snapshot
    /// it was opened with.
    pub fn replace(&self, library: ReplyLibrary) {
        *self.library.write().unwrap_or_else(|e| e.into_inner()) = library;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.library
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .enabled = enabled;
    }
}

impl ReplySource for QuickReplyLibrary {
    fn is_enabled(&self) -> bool {
        self.library
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .enabled
    }

    fn fetch(&self) -> anyhow::Result<SourceContent> {
        let library = self.library.read().unwrap_or_else(|e| e.into_inner());
        let content = SourceContent {
            scoped: collect(&library.chat, Origin::Scoped),
            global: collect(&library.global, Origin::Global),
        };
        tracing::debug!(
            scoped = content.scoped.len(),
            global = content.global.len(),
            "fetched quick replies"
        );
        Ok(content)
    }

    fn trigger(&self, group: &str, label: &str) -> anyhow::Result<()> {
        let message = {
            let library = self.library.read().unwrap_or_else(|e| e.into_inner());
            if !library.enabled {
                anyhow::bail!("quick replies are disabled");
            }
            library
                .chat
                .iter()
                .chain(library.global.iter())
                .filter(|link| set_name(&link.set) == group)
                .flat_map(|link| link.set.entries.iter())
                .find(|e| e.label == label && !e.hidden)
                .map(|e| e.message.clone())
                .ok_or_else(|| anyhow::anyhow!("no quick reply named \"{group}.{label}\""))?
        };
        (self.executor)(&message)
    }
}
