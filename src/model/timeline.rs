//! Date ⇄ pixel mapping for the chart.
//!
//! All arithmetic treats a month as exactly 30 days, whatever the calendar
//! says: `day_width = month_width_px / 30`. Layout diffs truncate to whole
//! days; the inverse mapping used by drags keeps fractional days so a
//! continuous drag never accumulates rounding drift.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use super::task::Task;
use super::tree::flatten_forest;

pub const DAYS_PER_MONTH: f32 = 30.0;
pub const DEFAULT_MONTH_WIDTH_PX: f32 = 100.0;
/// Lead/lag margin, in calendar months, around the forest's date bounds.
pub const DEFAULT_LEAD_MONTHS: u32 = 1;
/// Milestones render as a fixed-size marker regardless of zoom.
pub const MILESTONE_SIZE: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    /// Leaf activity with a computed width.
    Bar,
    /// Zero-duration marker with fixed geometry.
    Milestone,
    /// Parent span derived from descendant bounds; not directly draggable.
    Phase,
}

/// Resolved geometry for one row's bar, in chart-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub left: f32,
    pub width: f32,
    pub kind: BarKind,
}

/// The visible window: an origin instant and a pixel scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Leftmost instant of the window; the first visible month's start.
    pub start: DateTime<Utc>,
    pub month_width_px: f32,
}

impl Timeline {
    /// Window spanning the whole forest: earliest start floored to its month
    /// start, minus the lead margin. Empty forests have no window.
    pub fn spanning(tasks: &[Task], lead_months: u32, month_width_px: f32) -> Option<Self> {
        let (min_start, _) = forest_bounds(tasks)?;
        Some(Self {
            start: month_start(month_index(min_start) - lead_months as i32),
            month_width_px,
        })
    }

    pub fn day_width(&self) -> f32 {
        self.month_width_px / DAYS_PER_MONTH
    }

    /// Chart-local x of an instant (whole-day granularity, like the row
    /// layout itself).
    pub fn x_of(&self, instant: DateTime<Utc>) -> f32 {
        days_between(self.start, instant) as f32 * self.day_width()
    }

    /// Geometry for a task's bar. Phases derive their extent from the
    /// subtree on every call; milestones get the fixed marker size.
    pub fn bar_geometry(&self, task: &Task) -> BarGeometry {
        if task.has_children() {
            let (start, end) = task.effective_bounds();
            BarGeometry {
                left: self.x_of(start),
                width: days_between(start, end) as f32 * self.day_width(),
                kind: BarKind::Phase,
            }
        } else if task.is_milestone() {
            BarGeometry {
                left: self.x_of(task.start),
                width: MILESTONE_SIZE,
                kind: BarKind::Milestone,
            }
        } else {
            BarGeometry {
                left: self.x_of(task.start),
                width: days_between(task.start, task.end) as f32 * self.day_width(),
                kind: BarKind::Bar,
            }
        }
    }

    /// Inverse mapping: pixel delta → day delta, fractional days preserved.
    /// Divides by the exact month width, not the f32-rounded day width.
    pub fn days_of_px(&self, delta_x: f32) -> f64 {
        delta_x as f64 * DAYS_PER_MONTH as f64 / self.month_width_px as f64
    }

    /// Inverse mapping as a duration, at millisecond resolution.
    pub fn duration_of_px(&self, delta_x: f32) -> Duration {
        Duration::milliseconds((self.days_of_px(delta_x) * 86_400_000.0).round() as i64)
    }
}

/// Whole-day difference, truncating toward zero.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

/// Earliest start and latest end over the flattened forest.
pub fn forest_bounds(tasks: &[Task]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let all = flatten_forest(tasks);
    let min_start = all.iter().map(|t| t.start).min()?;
    let max_end = all.iter().map(|t| t.end).max()?;
    Some((min_start, max_end))
}

/// One `"Mon YYYY"` label per calendar month, from the forest's earliest
/// start (floored to month start, minus the lead) through its latest end
/// (ceiled to month end, plus the lead).
pub fn visible_months(tasks: &[Task], lead_months: u32) -> Vec<String> {
    let Some((min_start, max_end)) = forest_bounds(tasks) else {
        return Vec::new();
    };
    let first = month_index(min_start) - lead_months as i32;
    let last = month_index(max_end) + lead_months as i32;
    (first..=last)
        .map(|idx| month_start(idx).format("%b %Y").to_string())
        .collect()
}

/// Months since year 0, so month arithmetic is plain integer math.
fn month_index(instant: DateTime<Utc>) -> i32 {
    instant.year() * 12 + instant.month0() as i32
}

fn month_start(index: i32) -> DateTime<Utc> {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    // Day 1 of a 1..=12 month always exists.
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
        .and_utc()
}
