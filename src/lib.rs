/// weft — streaming message assembly for agent chat clients.
///
/// An agent backend streams an open-ended sequence of heterogeneous
/// chunks: user turns, assistant text, control traffic, plan snapshots
/// and deltas, tool invocations with half-transmitted JSON payloads,
/// finish markers. This crate folds that sequence into the three
/// projections a chat front end actually renders, and nothing else:
///
///   ┌────────────────────────────────────────────────────┐
///   │  transport (SSE, websocket, history load — yours)  │
///   └──────────────────────┬─────────────────────────────┘
///                   Chunk  │  append / replace_all / pump
///   ┌──────────────────────▼─────────────────────────────┐
///   │  StreamSession — one fold pass per chunk           │
///   │    turns      turn-grouped transcript              │
///   │    plan       ordered task plan with step status   │
///   │    workspace  tool-invocation timeline + pin       │
///   └──────────────────────┬─────────────────────────────┘
///                          │  read-only projections
///   ┌──────────────────────▼─────────────────────────────┐
///   │  presentation (rendering, layout — also yours)     │
///   └────────────────────────────────────────────────────┘
///
/// Live delivery and bulk replay produce identical projections; a
/// cancelled stream cannot deliver late (generation-counted handles);
/// and truncated tool payloads decode best-effort via `partial_json`
/// instead of erroring. The fold path never raises.
pub mod chunk;
pub mod config;
pub mod partial_json;
pub mod plan;
pub mod session;
pub mod telemetry;
pub mod turns;
pub mod workspace;

pub use chunk::{Chunk, ChunkKind, Role};
pub use config::AssemblyConfig;
pub use partial_json::decode;
pub use plan::{PlanAction, PlanBoard, PlanStep, StepPatch, StepStatus};
pub use session::{pump, StreamHandle, StreamSession};
pub use telemetry::StreamStats;
pub use turns::Turn;
pub use workspace::Workspace;
