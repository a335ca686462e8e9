/// Workspace projection — the side-panel timeline of tool invocations.
///
/// Filters the full chunk sequence (not the turn-grouped view) down to the
/// tool chunks, in original order, holding arena indices so the timeline
/// and the transcript share the same chunk objects. The selection slot
/// lives here too: the panel either follows the most recent invocation
/// (live mode) or stays pinned on one the user scrubbed to.
use serde::Serialize;

// ── Workspace ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workspace {
    /// Arena indices of tool chunks, chronological
    entries: Vec<usize>,
    /// Presentation-set pin; `None` means follow the latest entry
    pinned: Option<usize>,
}

impl Workspace {
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record one tool chunk's arena index. The session decides what
    /// counts as a tool; the timeline just keeps order.
    pub fn push(&mut self, idx: usize) {
        self.entries.push(idx);
    }

    /// Drop everything, including the pin — stale indices must not
    /// survive a wholesale replacement.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pinned = None;
    }

    /// Pin the detail view on a specific timeline entry. Rejected unless
    /// the index is actually in the timeline.
    pub fn pin(&mut self, idx: usize) -> bool {
        if self.entries.contains(&idx) {
            self.pinned = Some(idx);
            true
        } else {
            false
        }
    }

    /// Back to live mode: the detail view tracks the newest entry again.
    pub fn follow_latest(&mut self) {
        self.pinned = None;
    }

    pub fn pinned(&self) -> Option<usize> {
        self.pinned
    }

    /// The entry the detail panel should show: the pin if set, else the
    /// most recent entry, else nothing.
    pub fn focused(&self) -> Option<usize> {
        self.pinned.or_else(|| self.entries.last().copied())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
