//! Name filtering and collapse-state collection.

use std::collections::HashSet;

use super::task::Task;

/// Keep a task if its name contains the query (case-insensitive) or if any
/// descendant matches; children lists are rebuilt to the matching-or-
/// ancestor-of-matching subset. Non-matching leaves are dropped even under a
/// matching parent. An emptied children list becomes `None`, keeping the
/// leaf representation.
pub fn filter_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.is_empty() {
        return tasks.to_vec();
    }
    filter_in(tasks, &query.to_lowercase())
}

fn filter_in(tasks: &[Task], needle: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter_map(|task| {
            let name_match = task.name.to_lowercase().contains(needle);
            let kept_children = task
                .children
                .as_deref()
                .map(|c| filter_in(c, needle))
                .unwrap_or_default();
            if !name_match && kept_children.is_empty() {
                return None;
            }
            let mut kept = task.clone();
            kept.children = (!kept_children.is_empty()).then_some(kept_children);
            Some(kept)
        })
        .collect()
}

/// Every task id whose `hide_children` flag is set, across the whole forest.
/// The render layer suppresses rows and bars beneath these ids symmetrically.
pub fn collect_hidden_ids(tasks: &[Task]) -> HashSet<String> {
    let mut hidden = HashSet::new();
    collect_in(tasks, &mut hidden);
    hidden
}

fn collect_in(tasks: &[Task], hidden: &mut HashSet<String>) {
    for task in tasks {
        if task.hide_children {
            hidden.insert(task.id.clone());
        }
        if let Some(children) = &task.children {
            collect_in(children, hidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    fn three_level_tree() -> Vec<Task> {
        let leaf = Task::new("LEAF", "Drywall Demo", date(2021, 1, 1), date(2021, 1, 5));
        let other = Task::new("OTHER", "Paint", date(2021, 1, 6), date(2021, 1, 9));
        let mut mid = Task::new("MID", "Construction", date(2021, 1, 1), date(2021, 1, 9));
        mid.children = Some(vec![leaf, other]);
        let mut root = Task::new("ROOT", "Project", date(2021, 1, 1), date(2021, 1, 9));
        root.children = Some(vec![mid]);
        vec![root]
    }

    #[test]
    fn keeps_ancestors_of_matches_and_drops_the_rest() {
        let filtered = filter_tasks(&three_level_tree(), "drywall");
        assert_eq!(filtered.len(), 1);
        let root = &filtered[0];
        assert_eq!(root.id, "ROOT");
        let mid = &root.children.as_ref().unwrap()[0];
        assert_eq!(mid.id, "MID");
        let kept: Vec<&str> = mid
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(kept, vec!["LEAF"]);
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        assert_eq!(filter_tasks(&three_level_tree(), "WALL DE").len(), 1);
        assert!(filter_tasks(&three_level_tree(), "turbine").is_empty());
    }

    #[test]
    fn matching_parent_still_filters_its_children() {
        // "Construction" matches MID; its non-matching leaves are dropped
        // and MID keeps no children field at all.
        let filtered = filter_tasks(&three_level_tree(), "construction");
        let mid = &filtered[0].children.as_ref().unwrap()[0];
        assert_eq!(mid.id, "MID");
        assert_eq!(mid.children, None);
    }

    #[test]
    fn empty_query_returns_the_forest_unchanged() {
        let tree = three_level_tree();
        assert_eq!(filter_tasks(&tree, ""), tree);
    }

    #[test]
    fn collects_collapsed_ids_recursively() {
        let mut tree = three_level_tree();
        tree[0].hide_children = true;
        tree[0].children.as_mut().unwrap()[0].hide_children = true;

        let hidden = collect_hidden_ids(&tree);
        assert_eq!(
            hidden,
            HashSet::from(["ROOT".to_string(), "MID".to_string()])
        );
    }
}
