/// Turn assembly — grouping the flat chunk sequence into transcript entries.
///
/// A turn is a maximal contiguous run of same-role chunks. The fold has a
/// single implicit state, the open turn at the tail of the list: a chunk
/// whose role matches joins it, any other role closes it and opens a new
/// one. Finish markers and `is_last` flags do NOT close turns — turns
/// close strictly on role change; the flags only tell consumers whether a
/// turn is still in progress (live stream vs. replayed history).
///
/// Turns hold indices into the session's chunk arena, never copies, so the
/// transcript and the workspace timeline share the same chunk objects.
/// Grouping is lossless: flattening the turns in order reproduces the
/// arena order exactly.
use serde::Serialize;

use crate::chunk::{Chunk, Role};

// ── Turn ──────────────────────────────────────────────────────────────────────

/// One transcript entry: a contiguous same-role run of chunks. Derived
/// state — recomputed from the arena, never created independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// First member's backend id, else `turn-{arena index}`
    pub id: String,
    pub role: Role,
    /// Arena indices of member chunks, in arrival order
    pub chunks: Vec<usize>,
}

impl Turn {
    /// Whether this turn has been explicitly completed: some member
    /// carries `is_finish`/`is_last` or is a finish marker. Replayed
    /// history reads as settled; a live tail turn does not.
    pub fn is_settled(&self, arena: &[Chunk]) -> bool {
        self.members(arena)
            .any(|c| c.is_finish || c.is_last || c.is_finish_marker())
    }

    /// Whether this turn ends in a request for user input.
    pub fn awaits_user_input(&self, arena: &[Chunk]) -> bool {
        self.members(arena).any(|c| c.is_user_input_request())
    }

    fn members<'a>(&'a self, arena: &'a [Chunk]) -> impl Iterator<Item = &'a Chunk> {
        self.chunks.iter().filter_map(|&idx| arena.get(idx))
    }
}

// ── Folding ───────────────────────────────────────────────────────────────────

/// Fold one arena index into the turn list: extend the open turn on a
/// role match, open a new turn otherwise. Out-of-range indices are
/// ignored.
pub fn push(turns: &mut Vec<Turn>, arena: &[Chunk], idx: usize) {
    let Some(chunk) = arena.get(idx) else { return };
    if let Some(open) = turns.last_mut() {
        if open.role == chunk.role {
            open.chunks.push(idx);
            return;
        }
    }
    turns.push(Turn {
        id: chunk.id.clone().unwrap_or_else(|| format!("turn-{idx}")),
        role: chunk.role,
        chunks: vec![idx],
    });
}

/// Rebuild the whole turn list from scratch. Idempotent: the same arena
/// always produces byte-identical groupings — nothing but roles and
/// arrival order influences the result.
pub fn rebuild(arena: &[Chunk]) -> Vec<Turn> {
    let mut turns = Vec::new();
    for idx in 0..arena.len() {
        push(&mut turns, arena, idx);
    }
    turns
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkKind;

    fn chunk(role: Role) -> Chunk {
        Chunk::new(role, ChunkKind::Text)
    }

    #[test]
    fn test_groups_contiguous_same_role_runs() {
        let arena = vec![
            chunk(Role::User),
            chunk(Role::Assistant),
            chunk(Role::Assistant),
            chunk(Role::InnerControl),
            chunk(Role::Assistant),
        ];
        let turns = rebuild(&arena);
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].chunks, vec![1, 2]);
        assert_eq!(turns[2].role, Role::InnerControl);
        assert_eq!(turns[3].chunks, vec![4]);
    }

    #[test]
    fn test_flattening_turns_is_lossless() {
        let roles = [
            Role::User,
            Role::User,
            Role::Assistant,
            Role::InnerControl,
            Role::InnerControl,
            Role::Assistant,
            Role::User,
        ];
        let arena: Vec<Chunk> = roles.iter().map(|&r| chunk(r)).collect();
        let turns = rebuild(&arena);
        let flattened: Vec<usize> = turns.iter().flat_map(|t| t.chunks.clone()).collect();
        assert_eq!(flattened, (0..arena.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let arena = vec![chunk(Role::User), chunk(Role::Assistant), chunk(Role::User)];
        assert_eq!(rebuild(&arena), rebuild(&arena));
    }

    #[test]
    fn test_finish_marker_does_not_close_turn() {
        let arena = vec![
            chunk(Role::Assistant),
            Chunk::new(Role::Assistant, ChunkKind::FinishReason),
            chunk(Role::Assistant),
        ];
        let turns = rebuild(&arena);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].chunks, vec![0, 1, 2]);
    }

    #[test]
    fn test_turn_id_prefers_backend_id() {
        let arena = vec![
            chunk(Role::User).with_id("u-1"),
            chunk(Role::Assistant),
        ];
        let turns = rebuild(&arena);
        assert_eq!(turns[0].id, "u-1");
        assert_eq!(turns[1].id, "turn-1");
    }

    #[test]
    fn test_settled_and_user_input_helpers() {
        let mut finished = chunk(Role::Assistant);
        finished.is_finish = true;
        let arena = vec![
            chunk(Role::Assistant),
            finished,
            chunk(Role::User),
            Chunk::new(Role::Assistant, ChunkKind::UserInput),
        ];
        let turns = rebuild(&arena);
        assert!(turns[0].is_settled(&arena));
        assert!(!turns[1].is_settled(&arena));
        assert!(turns[2].awaits_user_input(&arena));
        assert!(!turns[0].awaits_user_input(&arena));
    }

    #[test]
    fn test_incremental_push_matches_rebuild() {
        let arena = vec![
            chunk(Role::User),
            chunk(Role::Assistant),
            chunk(Role::Assistant),
            chunk(Role::User),
        ];
        let mut incremental = Vec::new();
        for idx in 0..arena.len() {
            push(&mut incremental, &arena, idx);
        }
        assert_eq!(incremental, rebuild(&arena));
    }
}
