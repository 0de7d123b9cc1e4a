//! The in-flight pointer interaction.
//!
//! At most one drag exists at a time: a snapshot of the grabbed task's
//! original bounds plus the pointer-down x. Every pointer move recomputes
//! the dates from that anchor, never incrementally, and the caller pushes
//! each result into the store so the bar tracks the pointer continuously
//! rather than jumping on release.

use chrono::{DateTime, Utc};
use log::debug;

use crate::model::{Task, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift both bounds equally.
    Move,
    /// Change only `start`; `end` stays anchored.
    ResizeLeft,
    /// Change only `end`; `start` stays anchored.
    ResizeRight,
}

#[derive(Debug, Clone)]
struct DragState {
    task_id: String,
    mode: DragMode,
    anchor_x: f32,
    original_start: DateTime<Utc>,
    original_end: DateTime<Utc>,
}

/// New dates for the dragged task, to be fed into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub task_id: String,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: Option<DragState>,
}

impl DragController {
    /// Idle → Dragging, on pointer-down over a bar body or edge handle.
    /// Milestones only support `Move`; a second pointer-down while a drag
    /// is active is ignored.
    pub fn begin(&mut self, task: &Task, mode: DragMode, pointer_x: f32) {
        if self.state.is_some() {
            debug!("drag of {:?} ignored: another drag is active", task.id);
            return;
        }
        if task.is_milestone() && mode != DragMode::Move {
            debug!("resize of milestone {:?} ignored", task.id);
            return;
        }
        self.state = Some(DragState {
            task_id: task.id.clone(),
            mode,
            anchor_x: pointer_x,
            original_start: task.start,
            original_end: task.end,
        });
    }

    /// Recompute dates for the current pointer position. Resizes clamp at
    /// the opposite bound so `start <= end` survives a crossover.
    pub fn pointer_moved(&self, pointer_x: f32, timeline: &Timeline) -> Option<DragUpdate> {
        let state = self.state.as_ref()?;
        let shift = timeline.duration_of_px(pointer_x - state.anchor_x);
        let (new_start, new_end) = match state.mode {
            DragMode::Move => (state.original_start + shift, state.original_end + shift),
            DragMode::ResizeLeft => (
                (state.original_start + shift).min(state.original_end),
                state.original_end,
            ),
            DragMode::ResizeRight => (
                state.original_start,
                (state.original_end + shift).max(state.original_start),
            ),
        };
        Some(DragUpdate {
            task_id: state.task_id.clone(),
            new_start,
            new_end,
        })
    }

    /// Dragging → Idle, on pointer-up anywhere. Returns the task id that
    /// was being dragged, if any.
    pub fn release(&mut self) -> Option<String> {
        self.state.take().map(|s| s.task_id)
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_dragging_task(&self, id: &str) -> bool {
        self.state.as_ref().is_some_and(|s| s.task_id == id)
    }
}
