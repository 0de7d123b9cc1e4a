//! Pure mutation algorithms over the task forest.
//!
//! Every operation takes the current forest by reference and returns a fresh
//! one, rebuilding each ancestor's children list along the path to the
//! mutated node. `None` means "id not found": the caller keeps its tree and
//! treats the call as a no-op. The [`ScheduleStore`](super::store) is the
//! only caller that commits these results.

use chrono::{DateTime, Utc};

use super::task::{Task, TaskPatch};

/// Why a re-parent request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("selected task not found: {0}")]
    SelectedNotFound(String),
    #[error("target task not found: {0}")]
    TargetNotFound(String),
    #[error("cannot make {selected} a child of {target}: target is inside the moved subtree")]
    WouldCycle { selected: String, target: String },
}

/// Depth-first search for a task anywhere in the forest; first match wins.
pub fn find_task_by_id<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    for task in tasks {
        if task.id == id {
            return Some(task);
        }
        if let Some(children) = &task.children {
            if let Some(found) = find_task_by_id(children, id) {
                return Some(found);
            }
        }
    }
    None
}

pub fn count_tasks(tasks: &[Task]) -> usize {
    tasks.iter().map(|t| t.flatten().len()).sum()
}

/// All tasks in the forest, depth-first.
pub fn flatten_forest(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().flat_map(|t| t.flatten()).collect()
}

/// Replace only `start`/`end` on the matching task, leaving every other
/// field — and every other task — untouched. Ancestor and dependent dates
/// are never adjusted.
pub fn update_task(
    tasks: &[Task],
    id: &str,
    new_start: DateTime<Utc>,
    new_end: DateTime<Utc>,
) -> Option<Vec<Task>> {
    let mut found = false;
    let rebuilt = map_by_id(tasks, id, &mut found, &mut |task| {
        task.start = new_start;
        task.end = new_end;
    });
    found.then_some(rebuilt)
}

/// Merge a [`TaskPatch`] onto the matching task.
pub fn update_task_properties(tasks: &[Task], id: &str, patch: &TaskPatch) -> Option<Vec<Task>> {
    let mut found = false;
    let rebuilt = map_by_id(tasks, id, &mut found, &mut |task| patch.apply_to(task));
    found.then_some(rebuilt)
}

/// Delete the matching task and its entire subtree. A parent whose children
/// list empties loses the `children` field entirely, restoring the leaf
/// representation.
pub fn remove_task(tasks: &[Task], id: &str) -> Option<Vec<Task>> {
    let mut found = false;
    let rebuilt = remove_in(tasks, id, &mut found);
    found.then_some(rebuilt)
}

/// Append `new_task` to the identified parent's children, creating the list
/// if absent. The caller supplies a unique id and a `parent_id` on the new
/// task matching the destination.
pub fn add_task(tasks: &[Task], new_task: Task, parent_id: &str) -> Option<Vec<Task>> {
    let mut found = false;
    let mut pending = Some(new_task);
    let rebuilt = map_by_id(tasks, parent_id, &mut found, &mut |parent| {
        if let Some(child) = pending.take() {
            parent.children.get_or_insert_with(Vec::new).push(child);
        }
    });
    found.then_some(rebuilt)
}

/// Re-parent: detach `selected_id` (with its whole subtree) from wherever it
/// sits and append it as the last child of `target_id`, rewriting the moved
/// task's `parent_id`. The stored bounds of the target and of every ancestor
/// on the path to it widen to cover their direct children — they never
/// shrink. Re-parenting a task under itself or its own descendant is
/// rejected outright.
pub fn reorder_task(
    tasks: &[Task],
    selected_id: &str,
    target_id: &str,
) -> Result<Vec<Task>, ReorderError> {
    let selected = find_task_by_id(tasks, selected_id)
        .ok_or_else(|| ReorderError::SelectedNotFound(selected_id.to_string()))?
        .clone();
    if find_task_by_id(tasks, target_id).is_none() {
        return Err(ReorderError::TargetNotFound(target_id.to_string()));
    }
    if selected.flatten().iter().any(|t| t.id == target_id) {
        return Err(ReorderError::WouldCycle {
            selected: selected_id.to_string(),
            target: target_id.to_string(),
        });
    }

    let mut found = false;
    let mut rebuilt = remove_in(tasks, selected_id, &mut found);
    if !attach_to_target(&mut rebuilt, target_id, selected) {
        // Unreachable after the checks above; fail the whole operation
        // rather than dropping the detached subtree.
        return Err(ReorderError::TargetNotFound(target_id.to_string()));
    }
    Ok(rebuilt)
}

/// Rebuild the forest, applying `apply` to a fresh copy of every task whose
/// id matches. Sets `found` when at least one task matched.
fn map_by_id(
    tasks: &[Task],
    id: &str,
    found: &mut bool,
    apply: &mut impl FnMut(&mut Task),
) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id == id {
                *found = true;
                let mut updated = task.clone();
                apply(&mut updated);
                updated
            } else if let Some(children) = &task.children {
                let mut updated = task.clone();
                updated.children = Some(map_by_id(children, id, found, apply));
                updated
            } else {
                task.clone()
            }
        })
        .collect()
}

fn remove_in(tasks: &[Task], id: &str, found: &mut bool) -> Vec<Task> {
    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        if task.id == id {
            *found = true;
            continue;
        }
        let mut kept = task.clone();
        if let Some(children) = &task.children {
            let rebuilt = remove_in(children, id, found);
            kept.children = if rebuilt.is_empty() { None } else { Some(rebuilt) };
        }
        out.push(kept);
    }
    out
}

/// Insert `moved` as the last child of the target, widening stored bounds on
/// the unwind path. Returns false if the target is not in this subtree.
fn attach_to_target(tasks: &mut [Task], target_id: &str, moved: Task) -> bool {
    let mut pending = Some(moved);
    attach_in(tasks, target_id, &mut pending)
}

fn attach_in(tasks: &mut [Task], target_id: &str, pending: &mut Option<Task>) -> bool {
    for task in tasks.iter_mut() {
        if task.id == target_id {
            if let Some(mut child) = pending.take() {
                child.parent_id = Some(task.id.clone());
                task.children.get_or_insert_with(Vec::new).push(child);
            }
            widen_to_children(task);
            return true;
        }
        if let Some(children) = &mut task.children {
            if attach_in(children, target_id, pending) {
                widen_to_children(task);
                return true;
            }
        }
    }
    false
}

/// Widen a parent's stored `start`/`end` to the union of its direct
/// children's dates. Bounds only ever widen here, never shrink.
fn widen_to_children(parent: &mut Task) {
    let Some(children) = &parent.children else {
        return;
    };
    let mut min_start = parent.start;
    let mut max_end = parent.end;
    for child in children {
        min_start = min_start.min(child.start);
        max_end = max_end.max(child.end);
    }
    parent.start = min_start;
    parent.end = max_end;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    /// Three-level forest:
    /// PRJ ─┬─ PCN ─┬─ RFP (milestone)
    ///      │       └─ SUB
    ///      └─ CON ─── FRM
    /// plus a second root, MISC.
    fn sample_forest() -> Vec<Task> {
        let mut rfp = Task::new_milestone("RFP", "Issue RFP", date(2020, 10, 9));
        rfp.parent_id = Some("PCN".to_string());
        let mut sub = Task::new("SUB", "Submit Proposal", date(2020, 10, 12), date(2020, 10, 16));
        sub.parent_id = Some("PCN".to_string());

        let mut pcn = Task::new("PCN", "Preconstruction", date(2020, 10, 9), date(2020, 10, 16));
        pcn.parent_id = Some("PRJ".to_string());
        pcn.children = Some(vec![rfp, sub]);

        let mut frm = Task::new("FRM", "Framing", date(2020, 12, 22), date(2021, 1, 11));
        frm.parent_id = Some("CON".to_string());
        let mut con = Task::new("CON", "Construction", date(2020, 12, 8), date(2021, 1, 11));
        con.parent_id = Some("PRJ".to_string());
        con.children = Some(vec![frm]);

        let mut prj = Task::new("PRJ", "Data Hall", date(2020, 10, 9), date(2021, 1, 11));
        prj.children = Some(vec![pcn, con]);

        let misc = Task::new("MISC", "Side Work", date(2020, 11, 1), date(2020, 11, 5));
        vec![prj, misc]
    }

    #[test]
    fn find_recurses_into_children() {
        let forest = sample_forest();
        assert_eq!(find_task_by_id(&forest, "FRM").unwrap().name, "Framing");
        assert_eq!(find_task_by_id(&forest, "MISC").unwrap().name, "Side Work");
        assert!(find_task_by_id(&forest, "nope").is_none());
    }

    #[test]
    fn update_missing_id_is_a_noop() {
        let forest = sample_forest();
        assert_eq!(
            update_task(&forest, "missing-id", date(2021, 1, 1), date(2021, 1, 2)),
            None
        );
    }

    #[test]
    fn update_round_trips_and_touches_nothing_else() {
        let forest = sample_forest();
        let (s, e) = (date(2020, 10, 13), date(2020, 10, 20));
        let updated = update_task(&forest, "SUB", s, e).unwrap();

        let sub = find_task_by_id(&updated, "SUB").unwrap();
        assert_eq!((sub.start, sub.end), (s, e));
        assert_eq!(sub.name, "Submit Proposal");
        assert_eq!(sub.parent_id.as_deref(), Some("PCN"));

        // Every other task is unchanged, including ancestors' own dates.
        for id in ["PRJ", "PCN", "RFP", "CON", "FRM", "MISC"] {
            assert_eq!(
                find_task_by_id(&updated, id).unwrap(),
                find_task_by_id(&forest, id).unwrap(),
                "task {id} changed"
            );
        }
    }

    #[test]
    fn property_patch_merges_only_given_fields() {
        let forest = sample_forest();
        let patch = TaskPatch {
            name: Some("Framing & Drywall".to_string()),
            progress: Some(45),
            ..Default::default()
        };
        let updated = update_task_properties(&forest, "FRM", &patch).unwrap();
        let frm = find_task_by_id(&updated, "FRM").unwrap();
        assert_eq!(frm.name, "Framing & Drywall");
        assert_eq!(frm.progress, 45);
        assert_eq!(frm.start, date(2020, 12, 22));
    }

    #[test]
    fn remove_collapses_empty_parents_to_leaves() {
        let forest = sample_forest();
        let updated = remove_task(&forest, "FRM").unwrap();
        let con = find_task_by_id(&updated, "CON").unwrap();
        // The children field is gone, not an empty list.
        assert_eq!(con.children, None);
        assert_eq!(count_tasks(&updated), count_tasks(&forest) - 1);
    }

    #[test]
    fn remove_deletes_the_whole_subtree() {
        let forest = sample_forest();
        let updated = remove_task(&forest, "PCN").unwrap();
        assert!(find_task_by_id(&updated, "PCN").is_none());
        assert!(find_task_by_id(&updated, "RFP").is_none());
        assert!(find_task_by_id(&updated, "SUB").is_none());
        assert!(find_task_by_id(&updated, "CON").is_some());
    }

    #[test]
    fn remove_missing_id_is_a_noop() {
        let forest = sample_forest();
        assert_eq!(remove_task(&forest, "ghost"), None);
    }

    #[test]
    fn add_appends_to_parent_creating_children() {
        let forest = sample_forest();
        let mut new_task = Task::new("PNW", "Punch Walk", date(2020, 11, 2), date(2020, 11, 3));
        new_task.parent_id = Some("MISC".to_string());

        let updated = add_task(&forest, new_task, "MISC").unwrap();
        let misc = find_task_by_id(&updated, "MISC").unwrap();
        assert_eq!(misc.children.as_ref().unwrap().len(), 1);
        assert_eq!(misc.children.as_ref().unwrap()[0].id, "PNW");
    }

    #[test]
    fn add_with_missing_parent_is_a_noop() {
        let forest = sample_forest();
        let new_task = Task::new("X", "x", date(2020, 11, 2), date(2020, 11, 3));
        assert_eq!(add_task(&forest, new_task, "ghost"), None);
    }

    #[test]
    fn reorder_preserves_count_and_rewrites_parent_link() {
        let forest = sample_forest();
        let before = count_tasks(&forest);

        let updated = reorder_task(&forest, "SUB", "CON").unwrap();
        assert_eq!(count_tasks(&updated), before);

        let sub = find_task_by_id(&updated, "SUB").unwrap();
        assert_eq!(sub.parent_id.as_deref(), Some("CON"));
        let con = find_task_by_id(&updated, "CON").unwrap();
        assert_eq!(
            con.children.as_ref().unwrap().last().unwrap().id,
            "SUB",
            "moved task becomes the last child"
        );
    }

    #[test]
    fn reorder_moves_the_subtree_wholesale() {
        let forest = sample_forest();
        let updated = reorder_task(&forest, "PCN", "MISC").unwrap();
        let misc = find_task_by_id(&updated, "MISC").unwrap();
        // PCN arrives with its children intact.
        let pcn = misc.children.as_ref().unwrap().last().unwrap();
        assert_eq!(pcn.id, "PCN");
        assert_eq!(pcn.children.as_ref().unwrap().len(), 2);
        // And PRJ no longer contains it.
        let prj = find_task_by_id(&updated, "PRJ").unwrap();
        assert!(prj.children.as_ref().unwrap().iter().all(|c| c.id != "PCN"));
    }

    #[test]
    fn reorder_widens_target_bounds_but_never_shrinks() {
        let forest = sample_forest();
        // SUB (Oct 12–16) lands inside CON (Dec 8 – Jan 11): widen start only.
        let updated = reorder_task(&forest, "SUB", "CON").unwrap();
        let con = find_task_by_id(&updated, "CON").unwrap();
        assert_eq!(con.start, date(2020, 10, 12));
        assert_eq!(con.end, date(2021, 1, 11));

        // A child fully inside the target's span leaves bounds unchanged.
        let updated = reorder_task(&forest, "FRM", "PRJ").unwrap();
        let prj = find_task_by_id(&updated, "PRJ").unwrap();
        assert_eq!(prj.start, date(2020, 10, 9));
        assert_eq!(prj.end, date(2021, 1, 11));
    }

    #[test]
    fn reorder_widens_ancestors_on_the_path_to_the_target() {
        let forest = sample_forest();
        // Push MISC's dates out, then move it under FRM (deep in PRJ).
        let forest = update_task(&forest, "MISC", date(2021, 2, 1), date(2021, 3, 1)).unwrap();
        let updated = reorder_task(&forest, "MISC", "FRM").unwrap();
        for id in ["FRM", "CON", "PRJ"] {
            let task = find_task_by_id(&updated, id).unwrap();
            assert_eq!(task.end, date(2021, 3, 1), "{id} should widen to cover MISC");
        }
    }

    #[test]
    fn reorder_rejects_cycles_and_missing_ids() {
        let forest = sample_forest();
        assert_eq!(
            reorder_task(&forest, "PCN", "SUB"),
            Err(ReorderError::WouldCycle {
                selected: "PCN".to_string(),
                target: "SUB".to_string(),
            })
        );
        assert_eq!(
            reorder_task(&forest, "PCN", "PCN"),
            Err(ReorderError::WouldCycle {
                selected: "PCN".to_string(),
                target: "PCN".to_string(),
            })
        );
        assert_eq!(
            reorder_task(&forest, "ghost", "PCN"),
            Err(ReorderError::SelectedNotFound("ghost".to_string()))
        );
        assert_eq!(
            reorder_task(&forest, "PCN", "ghost"),
            Err(ReorderError::TargetNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn reorder_prunes_an_emptied_source_parent() {
        let forest = sample_forest();
        let updated = reorder_task(&forest, "FRM", "MISC").unwrap();
        let con = find_task_by_id(&updated, "CON").unwrap();
        assert_eq!(con.children, None);
    }

    #[test]
    fn milestones_stay_zero_duration_under_update() {
        let forest = sample_forest();
        let shifted = date(2020, 10, 9) + Duration::days(3);
        let updated = update_task(&forest, "RFP", shifted, shifted).unwrap();
        let rfp = find_task_by_id(&updated, "RFP").unwrap();
        assert!(rfp.is_milestone());
        assert_eq!(rfp.start, shifted);
    }
}
