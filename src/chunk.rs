/// Chunk model — the atomic unit of streamed agent output.
///
/// The backend emits a flat sequence of chunks: user turns, assistant text,
/// inner control traffic, plan snapshots and deltas, tool invocations, and
/// finish markers. All of them share one wire shape; what a chunk *is* gets
/// decided by the classifier predicates below, not by separate types.
///
/// The `type` tag is an open string set — backends introduce new tags
/// without coordination — so `ChunkKind` keeps the known tags as variants
/// and carries everything else in `Other`. Unrecognised kinds classify as
/// plain text and render generically; nothing crashes on a new tag.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::partial_json;

// ── Role ──────────────────────────────────────────────────────────────────────

/// Who a chunk belongs to. The set is closed: transports normalise
/// anything else before it reaches the assembly core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    InnerControl,
}

// ── ChunkKind ─────────────────────────────────────────────────────────────────

/// Open chunk type tag. Known tags get variants so matches stay
/// exhaustive; unknown tags survive round-trips verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// Plain display text (also the fallback for an empty tag)
    Text,
    /// Full task-plan snapshot
    Plan,
    /// Incremental plan delta (add/update/remove)
    PlanUpdate,
    /// The agent is asking the user for input
    UserInput,
    /// Marker chunk: the logical turn before it is complete
    FinishReason,
    /// Any tag this build does not know — tool tags land here
    Other(String),
}

impl ChunkKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" | "text" => ChunkKind::Text,
            "plan" => ChunkKind::Plan,
            "plan_update" => ChunkKind::PlanUpdate,
            "user_input" => ChunkKind::UserInput,
            "finish_reason" => ChunkKind::FinishReason,
            other => ChunkKind::Other(other.to_string()),
        }
    }

    /// The raw wire tag.
    pub fn tag(&self) -> &str {
        match self {
            ChunkKind::Text => "text",
            ChunkKind::Plan => "plan",
            ChunkKind::PlanUpdate => "plan_update",
            ChunkKind::UserInput => "user_input",
            ChunkKind::FinishReason => "finish_reason",
            ChunkKind::Other(tag) => tag,
        }
    }
}

impl Default for ChunkKind {
    fn default() -> Self {
        ChunkKind::Text
    }
}

impl Serialize for ChunkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ChunkKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ChunkKind::from_tag(&tag))
    }
}

// ── Chunk ─────────────────────────────────────────────────────────────────────

/// One unit of streamed agent output. Immutable once appended to a
/// session — replacement happens wholesale, never in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identity when the backend assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    #[serde(rename = "type", default)]
    pub kind: ChunkKind,
    /// Display text; empty for pure control/tool chunks
    #[serde(default)]
    pub content: String,
    /// Open payload specific to `kind`. Tool arguments/results arrive here
    /// as text that may be truncated mid-token at any render tick.
    #[serde(default)]
    pub detail: Map<String, Value>,
    /// Plan-step association: this chunk is detail output for that step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Epoch seconds. Stored history carries its own; 0 when absent.
    #[serde(default)]
    pub timestamp: i64,
    /// A later chunk completed this logical turn
    #[serde(rename = "isFinish", default)]
    pub is_finish: bool,
    /// No further user input is expected after this point
    #[serde(rename = "isLast", default)]
    pub is_last: bool,
    /// Optimistic placeholder, not yet acknowledged by the backend
    #[serde(default)]
    pub loading: bool,
}

impl Chunk {
    /// New chunk stamped with the current time. Wire chunks come in via
    /// serde instead and keep their own timestamps.
    pub fn new(role: Role, kind: ChunkKind) -> Self {
        Self {
            id: None,
            role,
            kind,
            content: String::new(),
            detail: Map::new(),
            step_id: None,
            timestamp: chrono::Utc::now().timestamp(),
            is_finish: false,
            is_last: false,
            loading: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_detail(mut self, detail: Map<String, Value>) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_step_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    // ── Classifier predicates ─────────────────────────────────────────────
    // Total and side-effect free: every downstream projector consults these.

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn is_control(&self) -> bool {
        self.role == Role::InnerControl
    }

    pub fn is_plan(&self) -> bool {
        self.kind == ChunkKind::Plan
    }

    pub fn is_plan_delta(&self) -> bool {
        self.kind == ChunkKind::PlanUpdate
    }

    pub fn is_finish_marker(&self) -> bool {
        self.kind == ChunkKind::FinishReason
    }

    pub fn is_user_input_request(&self) -> bool {
        self.kind == ChunkKind::UserInput
    }

    /// A tool invocation: a non-generic tag plus a tool-shaped payload
    /// (`status`, `arguments`, or `result` in `detail`). The same chunk is
    /// shared by the transcript and the workspace timeline.
    pub fn is_tool(&self) -> bool {
        matches!(self.kind, ChunkKind::Other(_))
            && (self.detail.contains_key("status")
                || self.detail.contains_key("arguments")
                || self.detail.contains_key("result"))
    }

    // ── Payload helpers ───────────────────────────────────────────────────

    /// Tool-call arguments, decoded best-effort. The payload is usually a
    /// string accumulated from stream deltas and may be cut mid-token;
    /// already-structured payloads pass through unchanged.
    pub fn tool_arguments(&self) -> Map<String, Value> {
        decoded_field(&self.detail, "arguments")
    }

    /// Tool result payload, decoded the same way as the arguments.
    pub fn tool_result(&self) -> Map<String, Value> {
        decoded_field(&self.detail, "result")
    }

    /// Tool execution status tag, if the payload carries one.
    pub fn tool_status(&self) -> Option<&str> {
        self.detail.get("status").and_then(Value::as_str)
    }
}

fn decoded_field(detail: &Map<String, Value>, key: &str) -> Map<String, Value> {
    match detail.get(key) {
        Some(Value::String(raw)) => partial_json::decode(raw),
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
