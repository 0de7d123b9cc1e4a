use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single node in the schedule forest.
///
/// A task is a leaf (atomic activity), a milestone (`start == end`), or a
/// phase (has children; its displayed extent is derived from the subtree).
/// `parent_id` is a denormalized back-link only — the authoritative
/// parent/child relation is `children` containment, and every operation that
/// moves a task rewrites the back-link to match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(with = "datetime_serde")]
    pub start: DateTime<Utc>,
    #[serde(with = "datetime_serde")]
    pub end: DateTime<Utc>,
    /// Progress percentage, 0–100.
    #[serde(default)]
    pub progress: i32,
    /// Whether the subtree is collapsed in the view.
    #[serde(default)]
    pub hide_children: bool,
    /// Intended sibling ordering; never re-sorted by any operation.
    #[serde(default)]
    pub display_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// `None`, not an empty list, once the last child is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Task>>,
    /// Informational links to other task ids; never validated and never used
    /// to reorder or propagate dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            progress: 0,
            hide_children: false,
            display_order: 0,
            parent_id: None,
            children: None,
            dependencies: None,
        }
    }

    /// Create a milestone: a zero-duration marker.
    pub fn new_milestone(
        id: impl Into<String>,
        name: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(id, name, date, date)
    }

    pub fn is_milestone(&self) -> bool {
        self.start == self.end
    }

    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// This task plus all of its descendants, depth-first.
    pub fn flatten(&self) -> Vec<&Task> {
        let mut out = vec![self];
        if let Some(children) = &self.children {
            for child in children {
                out.extend(child.flatten());
            }
        }
        out
    }

    /// Displayed extent of a phase: min start / max end over the node and its
    /// full descendant set, recomputed on demand.
    pub fn effective_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let mut min_start = self.start;
        let mut max_end = self.end;
        for task in self.flatten() {
            min_start = min_start.min(task.start);
            max_end = max_end.max(task.end);
        }
        (min_start, max_end)
    }
}

/// A partial overlay of task fields, merged by `update_task_properties`.
///
/// `parent_id` is deliberately absent: the back-link is owned by the tree
/// operations (`add_task`, `reorder_task`) and never patched directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub hide_children: Option<bool>,
    pub display_order: Option<i64>,
    pub dependencies: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the overlay onto a task. Progress is clamped to 0..=100 here,
    /// at the store boundary; date ordering is not re-checked.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(start) = self.start {
            task.start = start;
        }
        if let Some(end) = self.end {
            task.end = end;
        }
        if let Some(progress) = self.progress {
            task.progress = progress.clamp(0, 100);
        }
        if let Some(hide) = self.hide_children {
            task.hide_children = hide;
        }
        if let Some(order) = self.display_order {
            task.display_order = order;
        }
        if let Some(deps) = &self.dependencies {
            task.dependencies = Some(deps.clone());
        }
    }
}

/// Parse an instant from either an RFC 3339 timestamp or a bare
/// `YYYY-MM-DD` date (interpreted as UTC midnight). Both shapes occur on
/// the AI wire.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Serde helper keeping task dates ISO-8601 on the wire.
mod datetime_serde {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_instant(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    #[test]
    fn wire_shape_uses_camel_case_and_iso_dates() {
        let mut task = Task::new("RFP", "Issue RFP", date(2020, 10, 9), date(2020, 10, 16));
        task.parent_id = Some("PCN".to_string());
        task.display_order = 3;

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "RFP");
        assert_eq!(json["start"], "2020-10-09T00:00:00.000Z");
        assert_eq!(json["hideChildren"], false);
        assert_eq!(json["displayOrder"], 3);
        assert_eq!(json["parentId"], "PCN");
        // Leaf representation: no children key at all.
        assert!(json.get("children").is_none());
        assert!(json.get("dependencies").is_none());
    }

    #[test]
    fn deserializes_bare_dates_as_utc_midnight() {
        let task: Task = serde_json::from_str(
            r#"{"id":"A","name":"a","start":"2021-03-01","end":"2021-03-01T12:00:00.000Z","progress":40}"#,
        )
        .unwrap();
        assert_eq!(task.start, date(2021, 3, 1));
        assert_eq!(task.end, date(2021, 3, 1) + chrono::Duration::hours(12));
        assert!(!task.is_milestone());
    }

    #[test]
    fn effective_bounds_cover_the_whole_subtree() {
        let mut phase = Task::new("P", "Phase", date(2021, 1, 10), date(2021, 1, 20));
        let early = Task::new("A", "Early", date(2021, 1, 5), date(2021, 1, 12));
        let late = Task::new("B", "Late", date(2021, 1, 15), date(2021, 2, 1));
        phase.children = Some(vec![early, late]);

        assert_eq!(phase.effective_bounds(), (date(2021, 1, 5), date(2021, 2, 1)));
    }

    #[test]
    fn patch_clamps_progress_at_the_boundary() {
        let mut task = Task::new("A", "a", date(2021, 1, 1), date(2021, 1, 2));
        TaskPatch {
            progress: Some(250),
            ..Default::default()
        }
        .apply_to(&mut task);
        assert_eq!(task.progress, 100);
    }
}
