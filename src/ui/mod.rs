pub mod chart;
pub mod dialogs;
pub mod task_table;
pub mod theme;
pub mod toolbar;

use std::collections::HashSet;

use crate::model::Task;

/// One renderable row: a task and its tree depth.
///
/// Both panels render from the same row list, derived once per frame from
/// the filtered forest and the hidden-id set, so the table and the chart
/// always agree on what is visible and in which order.
#[derive(Debug, Clone, Copy)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub level: usize,
}

/// Depth-first rows, skipping the subtrees of collapsed tasks.
pub fn visible_rows<'a>(tasks: &'a [Task], hidden: &HashSet<String>) -> Vec<TaskRow<'a>> {
    let mut rows = Vec::new();
    push_rows(tasks, hidden, 0, &mut rows);
    rows
}

fn push_rows<'a>(
    tasks: &'a [Task],
    hidden: &HashSet<String>,
    level: usize,
    rows: &mut Vec<TaskRow<'a>>,
) {
    for task in tasks {
        rows.push(TaskRow { task, level });
        if hidden.contains(&task.id) {
            continue;
        }
        if let Some(children) = &task.children {
            push_rows(children, hidden, level + 1, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    #[test]
    fn collapsed_subtrees_vanish_from_both_panels_at_once() {
        let leaf = Task::new("C", "leaf", date(2021, 1, 1), date(2021, 1, 2));
        let mut mid = Task::new("B", "mid", date(2021, 1, 1), date(2021, 1, 2));
        mid.children = Some(vec![leaf]);
        let mut root = Task::new("A", "root", date(2021, 1, 1), date(2021, 1, 2));
        root.children = Some(vec![mid]);
        let forest = vec![root];

        let rows = visible_rows(&forest, &HashSet::new());
        let ids: Vec<&str> = rows.iter().map(|r| r.task.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(rows[2].level, 2);

        let hidden = HashSet::from(["B".to_string()]);
        let ids: Vec<&str> = visible_rows(&forest, &hidden)
            .iter()
            .map(|r| r.task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
