/// Telemetry — live assembly counters, held by the session.
///
/// The fold path never errors, so anomalies (stale appends, deltas aimed
/// at unknown steps, orphaned step children) degrade silently. These
/// counters are where they stay visible: the embedding application reads
/// or serialises a snapshot for its stats surface. Counters are cumulative
/// for the lifetime of the session object — a `reset()` starts a new
/// conversation, not a new process — and this module does no I/O;
/// persisting snapshots is the embedder's business.
use serde::{Deserialize, Serialize};

// ── Counters ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Chunks folded in, live or replayed
    pub chunks_appended: usize,
    /// Wholesale sequence replacements (history loads / replays)
    pub replacements: usize,
    /// Session resets (new conversations)
    pub resets: usize,
    /// Appends dropped because their stream handle was stale
    pub stale_drops: usize,
    /// Full plan snapshots applied
    pub plan_snapshots: usize,
    /// Plan deltas applied (including partially-ignored ones)
    pub plan_deltas: usize,
    /// Delta patches ignored: unknown step ids, unknown actions
    pub deltas_ignored: usize,
    /// Chunks whose `step_id` matched no plan step
    pub orphan_children: usize,
    /// Chunks admitted to the workspace timeline
    pub tool_entries: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let stats = StreamStats {
            chunks_appended: 12,
            replacements: 1,
            stale_drops: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: StreamStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }

    #[test]
    fn test_default_is_all_zero() {
        let stats = StreamStats::default();
        assert_eq!(stats.chunks_appended, 0);
        assert_eq!(stats.deltas_ignored, 0);
        assert_eq!(stats.orphan_children, 0);
    }
}
