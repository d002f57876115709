use serde::{Deserialize, Serialize};

/// A reusable constraint bundle referenced by id from strategies.
///
/// Segment contents are managed outside this core; only identity and project
/// scoping matter here. A segment with `project: None` is global and usable
/// from any project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: u64,
    pub name: String,
    /// Owning project; `None` means the segment is global.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Segment {
    /// True when a strategy in `project` may reference this segment.
    #[must_use]
    pub fn usable_from(&self, project: &str) -> bool {
        self.project.as_deref().map_or(true, |p| p == project)
    }
}
