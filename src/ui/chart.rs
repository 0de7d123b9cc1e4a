use chrono::Utc;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::drag::{DragController, DragMode};
use crate::model::{BarKind, ScheduleStore, Task, Timeline};
use crate::ui::theme;
use crate::ui::TaskRow;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Result details from interactions in the chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    pub changed: bool,
}

/// Render the timeline panel: month header, grid, and one bar per visible
/// row. Pointer events on bar bodies and edge handles feed the drag
/// controller, and every resulting date update goes straight into the
/// store so the bar follows the pointer.
pub fn show_chart(
    rows: &[TaskRow<'_>],
    months: &[String],
    timeline: &Timeline,
    drag: &mut DragController,
    store: &mut ScheduleStore,
    selected_task: &mut Option<String>,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let available = ui.available_size();
    let chart_width = (months.len() as f32 * timeline.month_width_px).max(available.x);
    let chart_height = HEADER_HEIGHT + (rows.len() as f32 * (ROW_HEIGHT + ROW_PADDING)) + 40.0;

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            draw_month_header(&painter, origin, timeline, months, chart_height);
            draw_today_line(&painter, origin, timeline, chart_height);

            // Alternating row backgrounds
            for i in 0..rows.len() {
                let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING);
                let row_bg = if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(chart_width, ROW_HEIGHT + ROW_PADDING),
                    ),
                    0.0,
                    row_bg,
                );
            }

            for (i, row) in rows.iter().enumerate() {
                let task = row.task;
                let y =
                    origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING) + ROW_PADDING;
                let is_selected = selected_task.as_deref() == Some(task.id.as_str());
                let geometry = timeline.bar_geometry(task);

                match geometry.kind {
                    BarKind::Phase => {
                        let span_rect = draw_phase_span(
                            &painter,
                            origin,
                            geometry.left,
                            geometry.width,
                            task,
                            y,
                            is_selected,
                        );
                        // Phases only select; their dates are derived.
                        let phase_response = ui.interact(
                            span_rect,
                            ui.make_persistent_id(("phase", task.id.as_str())),
                            Sense::click(),
                        );
                        if phase_response.clicked() {
                            *selected_task = Some(task.id.clone());
                            consumed_click = true;
                        }
                        hover_tooltip(ui, &phase_response, task);
                    }
                    BarKind::Milestone => {
                        let marker_rect = draw_milestone(
                            &painter,
                            origin,
                            geometry.left,
                            task,
                            y,
                            is_selected,
                        );
                        let marker_response = ui.interact(
                            marker_rect.expand(6.0),
                            ui.make_persistent_id(("milestone", task.id.as_str())),
                            Sense::click_and_drag(),
                        );
                        if marker_response.clicked() {
                            *selected_task = Some(task.id.clone());
                            consumed_click = true;
                        }
                        if marker_response.drag_started() {
                            drag.begin(task, DragMode::Move, pointer_x(&marker_response));
                            *selected_task = Some(task.id.clone());
                            consumed_click = true;
                        }
                        if marker_response.dragged() && drag.is_dragging_task(&task.id) {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                            if let Some(update) =
                                drag.pointer_moved(pointer_x(&marker_response), timeline)
                            {
                                interaction.changed |= store.set_task_dates(
                                    &update.task_id,
                                    update.new_start,
                                    update.new_end,
                                );
                            }
                        }
                        if marker_response.drag_stopped() {
                            drag.release();
                        }
                        hover_tooltip(ui, &marker_response, task);
                    }
                    BarKind::Bar => {
                        let bar_rect = draw_task_bar(
                            &painter,
                            origin,
                            geometry.left,
                            geometry.width,
                            task,
                            y,
                            is_selected,
                        );

                        let bar_response = ui.interact(
                            bar_rect,
                            ui.make_persistent_id(("bar", task.id.as_str())),
                            Sense::click_and_drag(),
                        );
                        let left_handle = Rect::from_min_max(
                            Pos2::new(bar_rect.left() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                            Pos2::new(bar_rect.left() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                        );
                        let right_handle = Rect::from_min_max(
                            Pos2::new(bar_rect.right() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                            Pos2::new(bar_rect.right() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                        );
                        let left_response = ui.interact(
                            left_handle.expand(4.0),
                            ui.make_persistent_id(("resize-left", task.id.as_str())),
                            Sense::drag(),
                        );
                        let right_response = ui.interact(
                            right_handle.expand(4.0),
                            ui.make_persistent_id(("resize-right", task.id.as_str())),
                            Sense::drag(),
                        );

                        if bar_response.clicked() {
                            *selected_task = Some(task.id.clone());
                            consumed_click = true;
                        }

                        if left_response.drag_started() {
                            drag.begin(task, DragMode::ResizeLeft, pointer_x(&left_response));
                        }
                        if right_response.drag_started() {
                            drag.begin(task, DragMode::ResizeRight, pointer_x(&right_response));
                        }
                        if bar_response.drag_started() {
                            drag.begin(task, DragMode::Move, pointer_x(&bar_response));
                        }
                        if bar_response.drag_started()
                            || left_response.drag_started()
                            || right_response.drag_started()
                        {
                            *selected_task = Some(task.id.clone());
                            consumed_click = true;
                        }

                        let active_response = if left_response.dragged() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                            Some(&left_response)
                        } else if right_response.dragged() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                            Some(&right_response)
                        } else if bar_response.dragged() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                            Some(&bar_response)
                        } else {
                            None
                        };
                        if let Some(active) = active_response {
                            if drag.is_dragging_task(&task.id) {
                                if let Some(update) =
                                    drag.pointer_moved(pointer_x(active), timeline)
                                {
                                    interaction.changed |= store.set_task_dates(
                                        &update.task_id,
                                        update.new_start,
                                        update.new_end,
                                    );
                                }
                            }
                        }

                        if bar_response.drag_stopped()
                            || left_response.drag_stopped()
                            || right_response.drag_stopped()
                        {
                            drag.release();
                        }

                        // Handle affordances
                        if is_selected || left_response.hovered() || right_response.hovered() {
                            if left_response.hovered() || right_response.hovered() {
                                ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                            } else if bar_response.hovered() {
                                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                            }
                            let handle_h = bar_rect.height() * 0.55;
                            let handle_y = bar_rect.center().y - handle_h / 2.0;
                            let lh = Rect::from_min_size(
                                Pos2::new(bar_rect.left() - 1.5, handle_y),
                                Vec2::new(4.0, handle_h),
                            );
                            let rh = Rect::from_min_size(
                                Pos2::new(bar_rect.right() - 2.5, handle_y),
                                Vec2::new(4.0, handle_h),
                            );
                            painter.rect_filled(lh, Rounding::same(2.0), theme::HANDLE_COLOR);
                            painter.rect_filled(rh, Rounding::same(2.0), theme::HANDLE_COLOR);
                        }

                        if bar_response.hovered()
                            || left_response.hovered()
                            || right_response.hovered()
                        {
                            hover_tooltip(ui, &bar_response, task);
                        }
                    }
                }
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                *selected_task = None;
            }
        });

    interaction
}

fn pointer_x(response: &egui::Response) -> f32 {
    response.interact_pointer_pos().map(|p| p.x).unwrap_or(0.0)
}

fn hover_tooltip(ui: &Ui, response: &egui::Response, task: &Task) {
    if response.hovered() {
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new(("task-tip", task.id.as_str())),
            |ui| {
                ui.strong(&task.name);
                if task.is_milestone() {
                    ui.label(task.start.format("%d/%m/%Y").to_string());
                } else {
                    ui.label(format!(
                        "{} → {}",
                        task.start.format("%d/%m/%Y"),
                        task.end.format("%d/%m/%Y"),
                    ));
                }
                ui.label(format!("Progress: {}%", task.progress));
            },
        );
    }
}

fn draw_month_header(
    painter: &egui::Painter,
    origin: Pos2,
    timeline: &Timeline,
    months: &[String],
    height: f32,
) {
    let width = months.len() as f32 * timeline.month_width_px;
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for (i, month) in months.iter().enumerate() {
        let x = origin.x + i as f32 * timeline.month_width_px;
        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, origin.y + height),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        painter.text(
            Pos2::new(x + 5.0, origin.y + HEADER_HEIGHT / 2.0),
            egui::Align2::LEFT_CENTER,
            month,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }
}

fn draw_today_line(painter: &egui::Painter, origin: Pos2, timeline: &Timeline, height: f32) {
    let x = origin.x + timeline.x_of(Utc::now());
    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    origin: Pos2,
    left: f32,
    width: f32,
    task: &Task,
    y: f32,
    is_selected: bool,
) -> Rect {
    let bar_width = width.max(6.0);
    let inset = theme::BAR_INSET;
    let bar_rect = Rect::from_min_size(
        Pos2::new(origin.x + left, y + inset),
        Vec2::new(bar_width, ROW_HEIGHT - inset * 2.0),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    let shadow_rect = bar_rect.translate(Vec2::new(1.0, 2.0));
    painter.rect_filled(shadow_rect, rounding, Color32::from_black_alpha(35));
    painter.rect_filled(bar_rect, rounding, theme::TASK_BAR);

    // Progress fill (darkened overlay)
    if task.progress > 0 {
        let progress_width = bar_width * (task.progress.clamp(0, 100) as f32 / 100.0);
        let progress_rect =
            Rect::from_min_size(bar_rect.min, Vec2::new(progress_width, bar_rect.height()));
        painter.rect_filled(progress_rect, rounding, theme::PROGRESS_OVERLAY);
        if task.progress < 98 {
            let tick_x = bar_rect.left() + progress_width;
            painter.line_segment(
                [
                    Pos2::new(tick_x, bar_rect.top() + 2.0),
                    Pos2::new(tick_x, bar_rect.bottom() - 2.0),
                ],
                Stroke::new(1.0, Color32::from_white_alpha(60)),
            );
        }
    }

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Task name on bar (single line, clipped to bar bounds)
    if bar_width > 30.0 {
        let galley = painter.layout_no_wrap(task.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }

    bar_rect
}

fn draw_phase_span(
    painter: &egui::Painter,
    origin: Pos2,
    left: f32,
    width: f32,
    task: &Task,
    y: f32,
    is_selected: bool,
) -> Rect {
    let span_width = width.max(6.0);
    let inset = theme::PHASE_BAR_INSET;
    let span_rect = Rect::from_min_size(
        Pos2::new(origin.x + left, y + inset),
        Vec2::new(span_width, ROW_HEIGHT - inset * 2.0),
    );

    painter.rect_filled(span_rect, Rounding::same(2.0), theme::PHASE_BAR);

    // End caps marking the derived extent
    let cap_h = ROW_HEIGHT - theme::BAR_INSET * 2.0;
    let cap_y = y + theme::BAR_INSET;
    for cap_x in [span_rect.left(), span_rect.right() - 3.0] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(cap_x, cap_y), Vec2::new(3.0, cap_h)),
            Rounding::same(1.0),
            theme::PHASE_BAR,
        );
    }

    if is_selected {
        painter.rect_stroke(
            span_rect.expand(1.5),
            Rounding::same(3.0),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    painter.text(
        Pos2::new(span_rect.right() + 8.0, y + ROW_HEIGHT / 2.0),
        egui::Align2::LEFT_CENTER,
        &task.name,
        theme::font_sub(),
        theme::TEXT_SECONDARY,
    );

    span_rect
}

fn draw_milestone(
    painter: &egui::Painter,
    origin: Pos2,
    left: f32,
    task: &Task,
    y: f32,
    is_selected: bool,
) -> Rect {
    let x = origin.x + left;
    let center = Pos2::new(x, y + ROW_HEIGHT / 2.0);
    let size = crate::model::timeline::MILESTONE_SIZE / 2.0;

    let points = vec![
        Pos2::new(center.x, center.y - size),
        Pos2::new(center.x + size, center.y),
        Pos2::new(center.x, center.y + size),
        Pos2::new(center.x - size, center.y),
    ];
    painter.add(egui::Shape::convex_polygon(
        points.clone(),
        theme::MILESTONE_FILL,
        Stroke::NONE,
    ));

    if is_selected {
        painter.add(egui::Shape::convex_polygon(
            points,
            Color32::TRANSPARENT,
            Stroke::new(2.0, theme::BORDER_ACCENT),
        ));
    }

    painter.text(
        Pos2::new(x + size + 6.0, y + ROW_HEIGHT / 2.0),
        egui::Align2::LEFT_CENTER,
        &task.name,
        theme::font_bar(),
        theme::TEXT_SECONDARY,
    );

    Rect::from_center_size(center, Vec2::splat(size * 2.0 + 2.0))
}
