//! Decoding and applying the AI service's action batch.
//!
//! The wire payload is `{"actions": [{"taskType", "target": {"id"}, "data"}]}`
//! with `taskType` matched case-insensitively. The whole batch is decoded
//! and validated before anything touches the store: an unknown tag or an
//! unparseable payload rejects the response outright. Apply-time failures
//! (an action naming an id that no longer exists) stay per-action no-ops,
//! so partial application of a batch is defined behavior, not an error.

use log::{debug, info};
use serde::Deserialize;

use super::AiError;
use crate::model::task::parse_instant;
use crate::model::{ScheduleStore, Task, TaskPatch};

/// One validated edit from the assistant.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleAction {
    Update { id: String, patch: TaskPatch },
    Delete { id: String },
    Add { parent_id: String, task: Task },
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    actions: Option<Vec<RawAction>>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(rename = "taskType")]
    task_type: String,
    #[serde(default)]
    target: Option<RawTarget>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    id: String,
}

/// Update payload: every field optional, dates as wire strings. Unknown
/// keys are ignored; `parentId` is accepted but skipped — containment is
/// changed by re-parenting, never by a property merge.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    name: Option<String>,
    start: Option<String>,
    end: Option<String>,
    progress: Option<i32>,
    hide_children: Option<bool>,
    display_order: Option<i64>,
    dependencies: Option<Vec<String>>,
    parent_id: Option<String>,
}

/// Turn the service's JSON into a validated action list, or the error the
/// service reported.
pub fn decode_response(value: serde_json::Value) -> Result<Vec<ScheduleAction>, AiError> {
    let raw: RawResponse = serde_json::from_value(value)
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
    if let Some(message) = raw.error {
        return Err(AiError::Service(message));
    }
    let Some(actions) = raw.actions else {
        return Err(AiError::MalformedResponse(
            "response has neither actions nor error".to_string(),
        ));
    };
    actions.into_iter().map(decode_action).collect()
}

fn decode_action(raw: RawAction) -> Result<ScheduleAction, AiError> {
    match raw.task_type.to_lowercase().as_str() {
        "update" => {
            let id = target_id(raw.target, "update")?;
            let update: UpdateData = match raw.data {
                Some(data) => serde_json::from_value(data)
                    .map_err(|e| AiError::MalformedResponse(format!("update data: {e}")))?,
                None => UpdateData::default(),
            };
            Ok(ScheduleAction::Update {
                id,
                patch: patch_from(update)?,
            })
        }
        "delete" => Ok(ScheduleAction::Delete {
            id: target_id(raw.target, "delete")?,
        }),
        "add" => {
            let data = raw.data.ok_or_else(|| {
                AiError::MalformedResponse("add action has no data".to_string())
            })?;
            let task: Task = serde_json::from_value(data)
                .map_err(|e| AiError::MalformedResponse(format!("add data: {e}")))?;
            let parent_id = task.parent_id.clone().ok_or_else(|| {
                AiError::MalformedResponse(format!("add action for {:?} has no parentId", task.id))
            })?;
            Ok(ScheduleAction::Add { parent_id, task })
        }
        other => Err(AiError::MalformedResponse(format!(
            "unknown taskType {other:?}"
        ))),
    }
}

fn target_id(target: Option<RawTarget>, kind: &str) -> Result<String, AiError> {
    target
        .map(|t| t.id)
        .ok_or_else(|| AiError::MalformedResponse(format!("{kind} action has no target.id")))
}

fn patch_from(data: UpdateData) -> Result<TaskPatch, AiError> {
    if let Some(skipped) = &data.parent_id {
        debug!("ignoring parentId {skipped:?} in update data; use a reorder instead");
    }
    Ok(TaskPatch {
        name: data.name,
        start: data.start.as_deref().map(parse_wire_date).transpose()?,
        end: data.end.as_deref().map(parse_wire_date).transpose()?,
        progress: data.progress,
        hide_children: data.hide_children,
        display_order: data.display_order,
        dependencies: data.dependencies,
    })
}

fn parse_wire_date(s: &str) -> Result<chrono::DateTime<chrono::Utc>, AiError> {
    parse_instant(s).ok_or_else(|| AiError::MalformedResponse(format!("invalid date {s:?}")))
}

/// Apply a validated batch to the store, sequentially, in array order.
/// There is no rollback: actions whose target has vanished are logged
/// no-ops and the rest of the batch still lands. Returns how many actions
/// changed the tree.
pub fn apply_actions(store: &mut ScheduleStore, actions: &[ScheduleAction]) -> usize {
    let mut applied = 0;
    for action in actions {
        let changed = match action {
            ScheduleAction::Update { id, patch } => store.apply_patch(id, patch),
            ScheduleAction::Delete { id } => store.remove(id),
            ScheduleAction::Add { parent_id, task } => store.add(task.clone(), parent_id),
        };
        if changed {
            applied += 1;
        }
    }
    info!("AI batch: {applied}/{} actions applied", actions.len());
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    fn seeded() -> ScheduleStore {
        let mut root = Task::new("PRJ", "Project", date(2021, 1, 1), date(2021, 3, 1));
        let task = Task::new("FRM", "Framing", date(2021, 1, 5), date(2021, 1, 20));
        root.children = Some(vec![task]);
        ScheduleStore::new(vec![root])
    }

    #[test]
    fn decodes_a_mixed_batch_with_case_insensitive_tags() {
        let actions = decode_response(json!({
            "actions": [
                { "taskType": "Update", "target": { "id": "FRM" },
                  "data": { "start": "2021-01-06", "progress": 50 } },
                { "taskType": "DELETE", "target": { "id": "OLD" } },
                { "taskType": "add", "target": { "id": "PRJ" },
                  "data": { "id": "NEW", "name": "Inspection",
                            "start": "2021-02-01", "end": "2021-02-03",
                            "parentId": "PRJ" } },
            ]
        }))
        .unwrap();

        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            ScheduleAction::Update {
                id: "FRM".to_string(),
                patch: TaskPatch {
                    start: Some(date(2021, 1, 6)),
                    progress: Some(50),
                    ..Default::default()
                },
            }
        );
        assert_eq!(actions[1], ScheduleAction::Delete { id: "OLD".to_string() });
        match &actions[2] {
            ScheduleAction::Add { parent_id, task } => {
                assert_eq!(parent_id, "PRJ");
                assert_eq!(task.id, "NEW");
                assert_eq!(task.end, date(2021, 2, 3));
            }
            other => panic!("expected add, got {other:?}"),
        }
    }

    #[test]
    fn service_error_short_circuits() {
        assert_eq!(
            decode_response(json!({ "error": "quota exceeded" })),
            Err(AiError::Service("quota exceeded".to_string()))
        );
    }

    #[test]
    fn unknown_tags_and_missing_fields_are_malformed() {
        assert!(matches!(
            decode_response(json!({ "actions": [{ "taskType": "rename" }] })),
            Err(AiError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_response(json!({ "actions": [{ "taskType": "update" }] })),
            Err(AiError::MalformedResponse(_))
        ));
        assert!(
            matches!(
                decode_response(json!({ "actions": [{ "taskType": "add", "data": {
                    "id": "X", "name": "x", "start": "2021-01-01", "end": "2021-01-02"
                }}] })),
                Err(AiError::MalformedResponse(_))
            ),
            "add without parentId must be rejected"
        );
        assert!(matches!(
            decode_response(json!({})),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn partial_application_keeps_earlier_edits() {
        let mut store = seeded();
        let actions = decode_response(json!({
            "actions": [
                { "taskType": "update", "target": { "id": "FRM" },
                  "data": { "end": "2021-01-25" } },
                { "taskType": "delete", "target": { "id": "GHOST" } },
            ]
        }))
        .unwrap();

        let applied = apply_actions(&mut store, &actions);
        assert_eq!(applied, 1);
        // The update to FRM survives the failed delete.
        assert_eq!(store.find("FRM").unwrap().end, date(2021, 1, 25));
    }

    #[test]
    fn update_keeps_existing_dates_when_data_omits_them() {
        let mut store = seeded();
        let actions = decode_response(json!({
            "actions": [
                { "taskType": "update", "target": { "id": "FRM" },
                  "data": { "name": "Framing & Drywall" } },
            ]
        }))
        .unwrap();
        apply_actions(&mut store, &actions);

        let frm = store.find("FRM").unwrap();
        assert_eq!(frm.name, "Framing & Drywall");
        assert_eq!(frm.start, date(2021, 1, 5));
        assert_eq!(frm.end, date(2021, 1, 20));
    }

    #[test]
    fn add_lands_under_the_requested_parent() {
        let mut store = seeded();
        let actions = decode_response(json!({
            "actions": [
                { "taskType": "add", "data": {
                    "id": "INS", "name": "Inspection",
                    "start": "2021-02-01", "end": "2021-02-03",
                    "parentId": "FRM" } },
            ]
        }))
        .unwrap();
        assert_eq!(apply_actions(&mut store, &actions), 1);

        let ins = store.find("INS").unwrap();
        assert_eq!(ins.parent_id.as_deref(), Some("FRM"));
        assert!(store.find("FRM").unwrap().has_children());
    }
}
