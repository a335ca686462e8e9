/// Plan projection — folding plan snapshots and deltas into an ordered
/// step list.
///
/// The backend periodically re-sends the whole plan as a `plan` chunk
/// (snapshot) and patches it between snapshots with `plan_update` chunks
/// carrying an `action` of `add`, `update`, or `remove`. The board applies
/// both against one ordered list keyed by step id:
///
///   snapshot — replace the list with the declared steps; `status` is the
///              one field that persists for ids that reappear
///   add      — append steps not already present; duplicates are ignored
///   update   — shallow-merge title/description/status in place; unknown
///              ids are ignored, never created
///   remove   — delete by id; absent ids are a no-op
///
/// All three actions are idempotent under re-application. Step order is
/// insertion order; updates never reorder. Chunks carrying a `step_id`
/// attach their arena index to that step's `children`.
///
/// Wire payloads are open JSON: extraction is tolerant, and a malformed
/// payload degrades to a no-op rather than an error.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Step status ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
}

impl StepStatus {
    /// Parse a wire tag. Unknown tags return `None` so a patch with a tag
    /// this build does not know leaves the recorded status untouched.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(StepStatus::Pending),
            "running" => Some(StepStatus::Running),
            "success" => Some(StepStatus::Success),
            "error" => Some(StepStatus::Error),
            _ => None,
        }
    }
}

// ── Plan step ─────────────────────────────────────────────────────────────────

/// One task-plan step. `children` are arena indices of the chunks that
/// streamed in under this step's `step_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStep {
    /// Unique and stable across the plan's lifetime
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
    pub children: Vec<usize>,
}

// ── Delta action ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Add,
    Update,
    Remove,
}

impl PlanAction {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "add" => Some(PlanAction::Add),
            "update" => Some(PlanAction::Update),
            "remove" => Some(PlanAction::Remove),
            _ => None,
        }
    }
}

// ── Step patch (wire shape) ───────────────────────────────────────────────────

/// What a snapshot entry or delta entry declares about one step. Every
/// field except the id is optional so `update` can shallow-merge.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<StepStatus>,
}

// ── Plan board ────────────────────────────────────────────────────────────────

/// The ordered task-plan projection.
#[derive(Debug, Default)]
pub struct PlanBoard {
    steps: Vec<PlanStep>,
}

impl PlanBoard {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Full reset from a `plan` chunk. Recorded statuses persist for ids
    /// that reappear; everything else — including `children` — is rebuilt
    /// from the declared set.
    pub fn apply_snapshot(&mut self, declared: Vec<StepPatch>) {
        let prior: Vec<(String, StepStatus)> = self
            .steps
            .drain(..)
            .map(|s| (s.id, s.status))
            .collect();
        for patch in declared {
            if self.position(&patch.id).is_some() {
                // Duplicate id within one snapshot — first declaration wins
                continue;
            }
            let recorded = prior
                .iter()
                .find(|(id, _)| *id == patch.id)
                .map(|&(_, status)| status);
            self.steps.push(PlanStep {
                status: recorded.or(patch.status).unwrap_or_default(),
                id: patch.id,
                title: patch.title.unwrap_or_default(),
                description: patch.description.unwrap_or_default(),
                children: Vec::new(),
            });
        }
    }

    /// Apply one delta. Returns how many patches were ignored because they
    /// referenced a step the board does not have (update only — `remove`
    /// of an absent id is a defined no-op, and a duplicate `add` is a
    /// defined skip).
    pub fn apply_delta(&mut self, action: PlanAction, patches: Vec<StepPatch>) -> usize {
        let mut ignored = 0;
        for patch in patches {
            match action {
                PlanAction::Add => {
                    if self.position(&patch.id).is_none() {
                        self.steps.push(PlanStep {
                            id: patch.id,
                            title: patch.title.unwrap_or_default(),
                            description: patch.description.unwrap_or_default(),
                            status: patch.status.unwrap_or_default(),
                            children: Vec::new(),
                        });
                    }
                }
                PlanAction::Update => match self.position(&patch.id) {
                    Some(pos) => {
                        let step = &mut self.steps[pos];
                        if let Some(title) = patch.title {
                            step.title = title;
                        }
                        if let Some(description) = patch.description {
                            step.description = description;
                        }
                        if let Some(status) = patch.status {
                            step.status = status;
                        }
                    }
                    None => ignored += 1,
                },
                PlanAction::Remove => {
                    self.steps.retain(|s| s.id != patch.id);
                }
            }
        }
        ignored
    }

    /// Attach a chunk's arena index to its step's `children`. Returns
    /// false when no step has that id (the caller counts orphans).
    pub fn attach_child(&mut self, step_id: &str, chunk_idx: usize) -> bool {
        match self.position(step_id) {
            Some(pos) => {
                let children = &mut self.steps[pos].children;
                if !children.contains(&chunk_idx) {
                    children.push(chunk_idx);
                }
                true
            }
            None => false,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

// ── Wire extraction ───────────────────────────────────────────────────────────

/// Pull the declared step list out of a `plan`/`plan_update` payload.
/// Missing or ill-typed `steps` yields an empty list; entries without a
/// usable id are dropped.
pub fn steps_from_detail(detail: &Map<String, Value>) -> Vec<StepPatch> {
    detail
        .get("steps")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(patch_from_value).collect())
        .unwrap_or_default()
}

/// The delta action of a `plan_update` payload, if it carries a known one.
pub fn action_from_detail(detail: &Map<String, Value>) -> Option<PlanAction> {
    detail
        .get("action")
        .and_then(Value::as_str)
        .and_then(PlanAction::from_tag)
}

fn patch_from_value(value: &Value) -> Option<StepPatch> {
    let obj = value.as_object()?;
    Some(StepPatch {
        id: step_id_of(obj.get("id")?)?,
        title: string_field(obj, "title"),
        description: string_field(obj, "description"),
        status: obj
            .get("status")
            .and_then(Value::as_str)
            .and_then(StepStatus::from_tag),
    })
}

/// Backends send step ids as JSON numbers or strings; both coerce to the
/// string identity the board keys on.
fn step_id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail_of(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn board_with(steps: Value) -> PlanBoard {
        let mut board = PlanBoard::default();
        board.apply_snapshot(steps_from_detail(&detail_of(json!({ "steps": steps }))));
        board
    }

    #[test]
    fn test_snapshot_declares_steps_in_order() {
        let board = board_with(json!([
            {"id": 1, "title": "A", "status": "pending"},
            {"id": 2, "title": "B", "description": "second"},
        ]));
        let steps = board.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "1");
        assert_eq!(steps[0].title, "A");
        assert_eq!(steps[0].status, StepStatus::Pending);
        assert_eq!(steps[1].description, "second");
    }

    #[test]
    fn test_snapshot_preserves_recorded_status_for_reappearing_ids() {
        let mut board = board_with(json!([{"id": "a", "title": "A"}]));
        board.apply_delta(
            PlanAction::Update,
            steps_from_detail(&detail_of(json!({"steps": [{"id": "a", "status": "running"}]}))),
        );
        board.attach_child("a", 7);

        // Re-sent snapshot: status persists, children rebuild from scratch
        board.apply_snapshot(steps_from_detail(&detail_of(json!({
            "steps": [{"id": "a", "title": "A", "status": "pending"}, {"id": "b", "title": "B"}]
        }))));
        assert_eq!(board.steps()[0].status, StepStatus::Running);
        assert!(board.steps()[0].children.is_empty());
        assert_eq!(board.steps()[1].status, StepStatus::Pending);
    }

    #[test]
    fn test_add_ignores_duplicates() {
        let mut board = board_with(json!([{"id": "a", "title": "A"}]));
        let patches = steps_from_detail(&detail_of(json!({
            "steps": [{"id": "a", "title": "SHOULD NOT APPLY"}, {"id": "b", "title": "B"}]
        })));
        let ignored = board.apply_delta(PlanAction::Add, patches);
        assert_eq!(ignored, 0);
        assert_eq!(board.steps().len(), 2);
        assert_eq!(board.steps()[0].title, "A");
        assert_eq!(board.steps()[1].title, "B");
    }

    #[test]
    fn test_update_merges_in_place_without_reordering() {
        let mut board = board_with(json!([
            {"id": "a", "title": "A"},
            {"id": "b", "title": "B", "description": "keep me"},
        ]));
        let ignored = board.apply_delta(
            PlanAction::Update,
            steps_from_detail(&detail_of(json!({
                "steps": [{"id": "b", "status": "success", "title": "B2"}]
            }))),
        );
        assert_eq!(ignored, 0);
        let steps = board.steps();
        assert_eq!(steps[0].id, "a");
        assert_eq!(steps[1].title, "B2");
        assert_eq!(steps[1].description, "keep me");
        assert_eq!(steps[1].status, StepStatus::Success);
    }

    #[test]
    fn test_update_unknown_id_is_ignored_and_counted() {
        let mut board = board_with(json!([{"id": "a", "title": "A"}]));
        let ignored = board.apply_delta(
            PlanAction::Update,
            steps_from_detail(&detail_of(json!({"steps": [{"id": "ghost", "status": "error"}]}))),
        );
        assert_eq!(ignored, 1);
        assert_eq!(board.steps().len(), 1);
        assert_eq!(board.steps()[0].status, StepStatus::Pending);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut board = board_with(json!([{"id": "a"}, {"id": "b"}]));
        let patches = steps_from_detail(&detail_of(json!({"steps": [{"id": "a"}]})));
        board.apply_delta(PlanAction::Remove, patches.clone());
        assert_eq!(board.steps().len(), 1);
        // Same delta again: defined no-op
        let ignored = board.apply_delta(PlanAction::Remove, patches);
        assert_eq!(ignored, 0);
        assert_eq!(board.steps().len(), 1);
        assert_eq!(board.steps()[0].id, "b");
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut board = board_with(json!([{"id": "a", "title": "A"}]));
        let patches = steps_from_detail(&detail_of(json!({
            "steps": [{"id": "a", "status": "running", "title": "A!"}]
        })));
        board.apply_delta(PlanAction::Update, patches.clone());
        let once: Vec<PlanStep> = board.steps().to_vec();
        board.apply_delta(PlanAction::Update, patches);
        assert_eq!(board.steps(), &once[..]);
    }

    #[test]
    fn test_attach_child_keeps_arrival_order() {
        let mut board = board_with(json!([{"id": "a"}]));
        assert!(board.attach_child("a", 3));
        assert!(board.attach_child("a", 5));
        assert!(board.attach_child("a", 5)); // re-delivery attaches once
        assert!(!board.attach_child("ghost", 9));
        assert_eq!(board.steps()[0].children, vec![3, 5]);
    }

    #[test]
    fn test_numeric_and_string_ids_coerce() {
        let patches = steps_from_detail(&detail_of(json!({
            "steps": [{"id": 7, "title": "num"}, {"id": "s7", "title": "str"}]
        })));
        assert_eq!(patches[0].id, "7");
        assert_eq!(patches[1].id, "s7");
    }

    #[test]
    fn test_malformed_payloads_degrade_to_no_ops() {
        assert!(steps_from_detail(&detail_of(json!({}))).is_empty());
        assert!(steps_from_detail(&detail_of(json!({"steps": "not an array"}))).is_empty());
        // Entries without a usable id are dropped
        let patches = steps_from_detail(&detail_of(json!({
            "steps": [{"title": "no id"}, {"id": null}, {"id": "ok"}]
        })));
        assert_eq!(patches.len(), 1);
        assert_eq!(action_from_detail(&detail_of(json!({"action": "explode"}))), None);
        assert_eq!(action_from_detail(&detail_of(json!({}))), None);
        assert_eq!(
            action_from_detail(&detail_of(json!({"action": "update"}))),
            Some(PlanAction::Update)
        );
        // Unknown status tag leaves recorded status untouched
        let mut board = board_with(json!([{"id": "a", "status": "running"}]));
        board.apply_delta(
            PlanAction::Update,
            steps_from_detail(&detail_of(json!({"steps": [{"id": "a", "status": "wat"}]}))),
        );
        assert_eq!(board.steps()[0].status, StepStatus::Running);
    }
}
