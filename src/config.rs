/// Assembly configuration — classification overrides, loaded from TOML.
///
/// The chunk `type` tag set is open: backends ship new tool tags without a
/// client release. The built-in predicate catches anything tool-shaped,
/// but deployments sometimes need to force a tag one way or the other —
/// a backend that sends `status`-bearing housekeeping chunks the panel
/// should not list, or a tool tag that streams no payload until it
/// finishes. Two lists cover both directions; everything else falls
/// through to the built-in predicate.
///
/// Loaded once at startup by the embedding application, outside the fold
/// path. Example:
///
/// ```toml
/// tool_types = ["browser_open"]
/// plain_types = ["heartbeat"]
/// ```
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Tags always admitted to the workspace timeline, payload or not
    #[serde(default)]
    pub tool_types: Vec<String>,
    /// Tags never admitted, even when the payload looks tool-shaped
    #[serde(default)]
    pub plain_types: Vec<String>,
}

impl AssemblyConfig {
    /// The workspace admission rule: overrides first, then the chunk's
    /// own predicate. `plain_types` wins over `tool_types`.
    pub fn is_tool(&self, chunk: &Chunk) -> bool {
        let tag = chunk.kind.tag();
        if self.plain_types.iter().any(|t| t == tag) {
            return false;
        }
        if self.tool_types.iter().any(|t| t == tag) {
            return true;
        }
        chunk.is_tool()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid assembly config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkKind, Role};
    use serde_json::json;

    fn tool_chunk(tag: &str) -> Chunk {
        Chunk::new(Role::Assistant, ChunkKind::from_tag(tag)).with_detail(
            json!({"status": "running"}).as_object().cloned().unwrap(),
        )
    }

    #[test]
    fn test_defaults_defer_to_builtin_predicate() {
        let cfg = AssemblyConfig::default();
        assert!(cfg.is_tool(&tool_chunk("bash")));
        assert!(!cfg.is_tool(&Chunk::new(Role::Assistant, ChunkKind::Text)));
    }

    #[test]
    fn test_plain_types_suppress_tool_shaped_chunks() {
        let cfg = AssemblyConfig {
            plain_types: vec!["heartbeat".to_string()],
            ..Default::default()
        };
        assert!(!cfg.is_tool(&tool_chunk("heartbeat")));
        assert!(cfg.is_tool(&tool_chunk("bash")));
    }

    #[test]
    fn test_tool_types_admit_payload_free_chunks() {
        let cfg = AssemblyConfig {
            tool_types: vec!["browser_open".to_string()],
            ..Default::default()
        };
        let bare = Chunk::new(Role::Assistant, ChunkKind::from_tag("browser_open"));
        assert!(!bare.is_tool());
        assert!(cfg.is_tool(&bare));
    }

    #[test]
    fn test_plain_wins_over_tool_listing() {
        let cfg = AssemblyConfig {
            tool_types: vec!["bash".to_string()],
            plain_types: vec!["bash".to_string()],
        };
        assert!(!cfg.is_tool(&tool_chunk("bash")));
    }

    #[test]
    fn test_toml_parsing_and_defaults() {
        let cfg = AssemblyConfig::from_toml_str(
            "tool_types = [\"browser_open\"]\nplain_types = [\"heartbeat\"]\n",
        )
        .unwrap();
        assert_eq!(cfg.tool_types, vec!["browser_open"]);
        assert_eq!(cfg.plain_types, vec!["heartbeat"]);

        // Empty file is a valid config
        let empty = AssemblyConfig::from_toml_str("").unwrap();
        assert!(empty.tool_types.is_empty());
        assert!(empty.plain_types.is_empty());

        assert!(AssemblyConfig::from_toml_str("tool_types = 3").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(&path, "plain_types = [\"noise\"]\n").unwrap();
        let cfg = AssemblyConfig::load(&path).unwrap();
        assert_eq!(cfg.plain_types, vec!["noise"]);

        let missing = AssemblyConfig::load(&dir.path().join("nope.toml"));
        assert!(missing.is_err());
    }
}
