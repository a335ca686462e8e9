/// Stream session controller.
///
/// Architecture:
///   transport task:  produces chunks (SSE, websocket, history load — not
///                    this crate's business) and feeds them in via `pump`
///                    or `append_streamed`
///   owner thread:    holds the `StreamSession`, drains chunks one at a
///                    time, hands read-only projections to the renderer
///
/// The session owns the canonical chunk arena and every projection derived
/// from it: the turn-grouped transcript, the plan board, and the workspace
/// timeline. Each incoming chunk (or wholesale replacement) runs exactly
/// one synchronous fold pass across all three before control returns —
/// folds never interleave, and the session itself performs no I/O.
///
/// Two invariants hold by construction:
/// - `append` per chunk and `replace_all` of the same sequence produce
///   identical projections (replacement is a reset plus the same fold)
/// - a stale producer cannot leak chunks across a reset or replay: every
///   live stream works through a generation-counted `StreamHandle`, and a
///   handle minted before the last `reset`/`replace_all` is refused
use futures_util::{Stream, StreamExt};

use crate::chunk::Chunk;
use crate::config::AssemblyConfig;
use crate::plan::{self, PlanBoard, PlanStep};
use crate::telemetry::StreamStats;
use crate::turns::{self, Turn};
use crate::workspace::Workspace;

// ── Stream handle ─────────────────────────────────────────────────────────────

/// Generation token tying a producer to the session lifetime it was
/// issued in. A reset or replay bumps the generation; deliveries from a
/// handle minted before that are detected and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle {
    generation: u64,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One conversation's assembly state. Explicitly constructed — never a
/// global — so independent sessions coexist and tests stay deterministic.
#[derive(Debug, Default)]
pub struct StreamSession {
    config: AssemblyConfig,
    chunks: Vec<Chunk>,
    turns: Vec<Turn>,
    plan: PlanBoard,
    workspace: Workspace,
    stats: StreamStats,
    generation: u64,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AssemblyConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    // ── Inbound ───────────────────────────────────────────────────────────

    /// Fold one chunk in. This is the trusted, caller-serialized path;
    /// live transports should go through `append_streamed` instead so a
    /// cancelled stream cannot deliver late.
    pub fn append(&mut self, chunk: Chunk) {
        let idx = self.chunks.len();
        self.chunks.push(chunk);
        self.fold_one(idx);
        self.stats.chunks_appended += 1;
    }

    /// Guarded append for live delivery. Returns false — and folds
    /// nothing — when the handle predates the last reset or replacement.
    pub fn append_streamed(&mut self, handle: &StreamHandle, chunk: Chunk) -> bool {
        if handle.generation != self.generation {
            self.stats.stale_drops += 1;
            tracing::debug!(
                stale = handle.generation,
                current = self.generation,
                "dropped chunk from cancelled stream"
            );
            return false;
        }
        self.append(chunk);
        true
    }

    /// Replace the whole sequence — history load or replay. Derived state
    /// is rebuilt from scratch by the same fold `append` uses, and any
    /// in-flight stream handle is invalidated: a replay supersedes the
    /// live stream it interrupts.
    pub fn replace_all(&mut self, chunks: Vec<Chunk>) {
        self.generation += 1;
        self.chunks = chunks;
        self.clear_derived();
        for idx in 0..self.chunks.len() {
            self.fold_one(idx);
        }
        self.stats.replacements += 1;
    }

    /// Start a new conversation: cancel any in-flight stream and clear
    /// everything in one pass. No projection ever mixes old and new state
    /// — they are all rebuilt before control returns.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.chunks.clear();
        self.clear_derived();
        self.stats.resets += 1;
    }

    /// Mint a handle for the current session lifetime. Hand one to each
    /// transport subscription before it starts delivering.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            generation: self.generation,
        }
    }

    // ── Projections (read-only) ───────────────────────────────────────────

    /// The canonical chunk arena, in arrival order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, idx: usize) -> Option<&Chunk> {
        self.chunks.get(idx)
    }

    /// Turn-grouped transcript.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Ordered task plan.
    pub fn plan(&self) -> &[PlanStep] {
        self.plan.steps()
    }

    /// Tool-invocation timeline.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    // ── Selection slot ────────────────────────────────────────────────────

    /// Presentation-facing navigation: pin the workspace detail view on a
    /// timeline entry, or pass `None` to follow the latest again. Returns
    /// false for an index that is not in the timeline.
    pub fn select(&mut self, idx: Option<usize>) -> bool {
        match idx {
            Some(idx) => self.workspace.pin(idx),
            None => {
                self.workspace.follow_latest();
                true
            }
        }
    }

    /// The chunk the workspace detail panel should display.
    pub fn focused_tool(&self) -> Option<(usize, &Chunk)> {
        let idx = self.workspace.focused()?;
        self.chunks.get(idx).map(|chunk| (idx, chunk))
    }

    // ── Fold ──────────────────────────────────────────────────────────────

    fn clear_derived(&mut self) {
        self.turns.clear();
        self.plan.clear();
        self.workspace.clear();
    }

    /// The single fold pass: one chunk through all three projections.
    /// Everything here is synchronous and total — anomalies are counted,
    /// never raised.
    fn fold_one(&mut self, idx: usize) {
        turns::push(&mut self.turns, &self.chunks, idx);

        let Some(chunk) = self.chunks.get(idx) else { return };

        if chunk.is_plan() {
            let declared = plan::steps_from_detail(&chunk.detail);
            self.plan.apply_snapshot(declared);
            self.stats.plan_snapshots += 1;
        } else if chunk.is_plan_delta() {
            match plan::action_from_detail(&chunk.detail) {
                Some(action) => {
                    let patches = plan::steps_from_detail(&chunk.detail);
                    let ignored = self.plan.apply_delta(action, patches);
                    self.stats.plan_deltas += 1;
                    if ignored > 0 {
                        self.stats.deltas_ignored += ignored;
                        tracing::debug!(ignored, "plan delta referenced unknown steps");
                    }
                }
                None => {
                    self.stats.deltas_ignored += 1;
                    tracing::debug!("plan delta without a known action dropped");
                }
            }
        }

        if let Some(step_id) = &chunk.step_id {
            if !self.plan.attach_child(step_id, idx) {
                self.stats.orphan_children += 1;
                tracing::debug!(step_id = %step_id, "chunk references unknown plan step");
            }
        }

        if self.config.is_tool(chunk) {
            self.workspace.push(idx);
            self.stats.tool_entries += 1;
        }
    }
}

// ── Pump ──────────────────────────────────────────────────────────────────────

/// Drain a chunk stream into the session until the stream ends or the
/// handle goes stale. Returns how many chunks were folded. The transport
/// side stays free-running; ordering within the stream is the producer's
/// contract.
pub async fn pump<S>(session: &mut StreamSession, handle: &StreamHandle, mut stream: S) -> usize
where
    S: Stream<Item = Chunk> + Unpin,
{
    let mut folded = 0;
    while let Some(chunk) = stream.next().await {
        if !session.append_streamed(handle, chunk) {
            break;
        }
        folded += 1;
    }
    folded
}

// ── Tests ─────────────────────────────────────────────────────────────────────
