use super::{RenderDescriptor, RenderKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Handle given to the presentation layer for one applied icon. Load
/// failures must be reported with the ticket of the icon that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconTicket {
    generation: u64,
}

impl IconTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks which icon descriptor is currently on screen.
///
/// Every applied descriptor bumps the render generation; a failure reported
/// against an older generation is dropped.
#[derive(Default)]
pub struct IconTracker {
    generation: AtomicU64,
    current: Mutex<Option<RenderDescriptor>>,
}

impl IconTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `descriptor` as the icon on screen and return its ticket.
    pub fn apply(&self, descriptor: RenderDescriptor) -> IconTicket {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *current = Some(descriptor);
        IconTicket { generation }
    }

    pub fn is_current(&self, ticket: IconTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn current(&self) -> Option<RenderDescriptor> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Swap the icon for an error placeholder if `ticket` still refers to the
    /// icon on screen. Returns the placeholder to render, or `None` when the
    /// failure belongs to a superseded icon.
    pub fn report_load_failure(&self, ticket: IconTicket, reason: &str) -> Option<RenderDescriptor> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != ticket.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation.load(Ordering::SeqCst),
                "ignoring load failure for superseded icon"
            );
            return None;
        }
        let slot = current.as_mut()?;
        tracing::warn!(generation = ticket.generation, reason, "icon failed to load");
        slot.kind = RenderKind::LoadFailed {
            diagnostic: reason.to_string(),
        };
        Some(slot.clone())
    }
}
