//! The single owner of the schedule forest.
//!
//! Every mutation goes through this type — the UI panels and the AI adapter
//! request changes here and never splice the tree themselves. Each accepted
//! mutation swaps in the rebuilt forest and bumps a version counter, which
//! is what consumers watch instead of comparing trees structurally. A
//! rejected mutation (unknown id, re-parent cycle) leaves the tree and the
//! version untouched and logs the reason.

use chrono::{DateTime, Utc};
use log::warn;

use super::task::{Task, TaskPatch};
use super::tree::{self, ReorderError};

#[derive(Debug, Default)]
pub struct ScheduleStore {
    tasks: Vec<Task>,
    version: u64,
}

impl ScheduleStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks, version: 0 }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Bumped on every accepted mutation; equal versions mean an identical
    /// tree.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        tree::find_task_by_id(&self.tasks, id)
    }

    pub fn count(&self) -> usize {
        tree::count_tasks(&self.tasks)
    }

    /// Replace only the dates of the identified task. Returns whether the
    /// tree changed.
    pub fn set_task_dates(
        &mut self,
        id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> bool {
        match tree::update_task(&self.tasks, id, new_start, new_end) {
            Some(tasks) => {
                self.commit(tasks);
                true
            }
            None => {
                warn!("date update skipped: no task with id {id:?}");
                false
            }
        }
    }

    /// Merge a property patch onto the identified task.
    pub fn apply_patch(&mut self, id: &str, patch: &TaskPatch) -> bool {
        match tree::update_task_properties(&self.tasks, id, patch) {
            Some(tasks) => {
                self.commit(tasks);
                true
            }
            None => {
                warn!("property update skipped: no task with id {id:?}");
                false
            }
        }
    }

    /// Delete the identified task and its subtree.
    pub fn remove(&mut self, id: &str) -> bool {
        match tree::remove_task(&self.tasks, id) {
            Some(tasks) => {
                self.commit(tasks);
                true
            }
            None => {
                warn!("remove skipped: no task with id {id:?}");
                false
            }
        }
    }

    /// Append a task under the identified parent. The new task arrives with
    /// its `parent_id` already pointing at the destination.
    pub fn add(&mut self, new_task: Task, parent_id: &str) -> bool {
        match tree::add_task(&self.tasks, new_task, parent_id) {
            Some(tasks) => {
                self.commit(tasks);
                true
            }
            None => {
                warn!("add skipped: no parent task with id {parent_id:?}");
                false
            }
        }
    }

    /// Append a task as a new root.
    pub fn add_root(&mut self, mut new_task: Task) {
        new_task.parent_id = None;
        let mut tasks = self.tasks.clone();
        tasks.push(new_task);
        self.commit(tasks);
    }

    /// Re-parent `selected_id` under `target_id`. Failures are logged
    /// no-ops; the error is also returned for the status line.
    pub fn reorder(&mut self, selected_id: &str, target_id: &str) -> Result<(), ReorderError> {
        match tree::reorder_task(&self.tasks, selected_id, target_id) {
            Ok(tasks) => {
                self.commit(tasks);
                Ok(())
            }
            Err(err) => {
                warn!("reorder {selected_id:?} -> {target_id:?} skipped: {err}");
                Err(err)
            }
        }
    }

    /// Flip the collapse flag on the identified task, persisting the view
    /// state into the tree.
    pub fn toggle_children(&mut self, id: &str) -> bool {
        let Some(task) = self.find(id) else {
            warn!("collapse toggle skipped: no task with id {id:?}");
            return false;
        };
        let patch = TaskPatch {
            hide_children: Some(!task.hide_children),
            ..Default::default()
        };
        self.apply_patch(id, &patch)
    }

    /// Swap in an entirely new forest (load from disk, seed data).
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.commit(tasks);
    }

    fn commit(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.version += 1;
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

    fn seeded() -> ScheduleStore {
        let mut root = Task::new("ROOT", "Project", date(2021, 1, 1), date(2021, 2, 1));
        let child = Task::new("A", "Groundwork", date(2021, 1, 1), date(2021, 1, 10));
        root.children = Some(vec![child]);
        ScheduleStore::new(vec![root])
    }

    #[test]
    fn rejected_mutations_leave_the_version_alone() {
        let mut store = seeded();
        let v = store.version();
        assert!(!store.set_task_dates("ghost", date(2021, 1, 1), date(2021, 1, 2)));
        assert!(!store.remove("ghost"));
        assert!(store.reorder("A", "ghost").is_err());
        assert_eq!(store.version(), v);
    }

    #[test]
    fn accepted_mutations_bump_the_version() {
        let mut store = seeded();
        let v = store.version();
        assert!(store.set_task_dates("A", date(2021, 1, 2), date(2021, 1, 11)));
        assert_eq!(store.version(), v + 1);
        assert!(store.toggle_children("ROOT"));
        assert_eq!(store.version(), v + 2);
        assert!(store.find("ROOT").unwrap().hide_children);
    }

    #[test]
    fn add_root_clears_any_stale_parent_link() {
        let mut store = seeded();
        let mut task = Task::new("B", "Extra", date(2021, 3, 1), date(2021, 3, 5));
        task.parent_id = Some("ROOT".to_string());
        store.add_root(task);
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[1].parent_id, None);
    }
}
