use egui::{Color32, RichText, Ui};

use crate::ui::theme;
use crate::ui::TaskRow;

/// Actions that the task table can request.
pub enum TableAction {
    None,
    Select(String),
    Delete(String),
    ToggleCollapse(String),
    /// Drop one row onto another: re-parent `selected` under `target`.
    Reorder {
        selected: String,
        target: String,
    },
    Add,
}

/// Render the left-side task table: one indented row per visible task.
/// Rows are drag sources and drop targets — dropping row A on row B asks
/// the store to re-parent A under B.
pub fn show_task_table(
    rows: &[TaskRow<'_>],
    selected_task: Option<&str>,
    ui: &mut Ui,
) -> TableAction {
    let mut action = TableAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Tasks")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", rows.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(
        RichText::new(format!("{}  Add Task", egui_phosphor::regular::PLUS))
            .color(Color32::WHITE)
            .size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = TableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(2.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, row) in rows.iter().enumerate() {
                if let Some(row_action) = show_row(ui, row, i, selected_task) {
                    action = row_action;
                }
                ui.add_space(1.0);
            }
        });

    action
}

fn show_row(
    ui: &mut Ui,
    row: &TaskRow<'_>,
    index: usize,
    selected_task: Option<&str>,
) -> Option<TableAction> {
    let task = row.task;
    let mut action = None;
    let is_selected = selected_task == Some(task.id.as_str());

    let row_bg = if is_selected {
        theme::BG_SELECTED
    } else if index % 2 == 0 {
        theme::BG_PANEL
    } else {
        theme::BG_DARK
    };
    let frame = egui::Frame {
        fill: row_bg,
        rounding: egui::Rounding::same(4.0),
        inner_margin: egui::Margin::symmetric(6.0, 4.0),
        outer_margin: egui::Margin::ZERO,
        stroke: egui::Stroke::NONE,
        shadow: egui::epaint::Shadow::NONE,
    };

    let drag_response = ui.dnd_drag_source(
        egui::Id::new(("row-drag", task.id.as_str())),
        task.id.clone(),
        |ui| {
            frame.show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 6.0;
                    ui.add_space(row.level as f32 * theme::INDENT_PER_LEVEL);

                    // Collapse toggle for phases
                    if task.has_children() {
                        let glyph = if task.hide_children { "+" } else { "−" };
                        let toggle = ui.add(
                            egui::Button::new(
                                RichText::new(glyph).size(11.0).color(theme::TEXT_SECONDARY),
                            )
                            .frame(false),
                        );
                        if toggle.clicked() {
                            action = Some(TableAction::ToggleCollapse(task.id.clone()));
                        }
                    } else {
                        ui.add_space(12.0);
                    }

                    let name = if task.is_milestone() {
                        format!("◆ {}", task.name)
                    } else {
                        task.name.clone()
                    };
                    let mut name_text = RichText::new(name).size(12.0).color(if is_selected {
                        Color32::WHITE
                    } else {
                        theme::TEXT_PRIMARY
                    });
                    if task.has_children() {
                        name_text = name_text.strong();
                    }
                    ui.add(egui::Label::new(name_text).truncate());

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.spacing_mut().item_spacing.x = 4.0;

                        let del_btn = ui.add(
                            egui::Button::new(
                                RichText::new("✕").size(10.0).color(theme::TEXT_DIM),
                            )
                            .frame(false),
                        );
                        if del_btn.on_hover_text("Delete task").clicked() {
                            action = Some(TableAction::Delete(task.id.clone()));
                        }

                        let pbar = egui::ProgressBar::new(task.progress.clamp(0, 100) as f32 / 100.0)
                            .desired_width(48.0)
                            .fill(theme::TASK_BAR)
                            .rounding(egui::Rounding::same(3.0));
                        ui.add(pbar);

                        ui.label(
                            RichText::new(task.end.format("%d/%m").to_string())
                                .size(10.0)
                                .color(theme::TEXT_SECONDARY),
                        );
                        ui.label(RichText::new("→").size(9.0).color(theme::TEXT_DIM));
                        ui.label(
                            RichText::new(task.start.format("%d/%m").to_string())
                                .size(10.0)
                                .color(theme::TEXT_SECONDARY),
                        );
                        ui.label(
                            RichText::new(&task.id)
                                .size(9.0)
                                .monospace()
                                .color(theme::TEXT_DIM),
                        );
                    });
                });
            });
        },
    );

    let response = drag_response.response;

    // Dropping another row here re-parents it under this task.
    if let Some(dropped) = response.dnd_release_payload::<String>() {
        if *dropped != task.id {
            return Some(TableAction::Reorder {
                selected: (*dropped).clone(),
                target: task.id.clone(),
            });
        }
    }
    if response.dnd_hover_payload::<String>().is_some() {
        ui.painter().rect_stroke(
            response.rect,
            egui::Rounding::same(4.0),
            egui::Stroke::new(1.5, theme::BORDER_ACCENT),
        );
    }

    // The drag source only senses drags; overlay a click sense so the whole
    // row still selects.
    let row_click = ui.interact(
        response.rect,
        egui::Id::new(("row-click", task.id.as_str())),
        egui::Sense::click(),
    );
    if row_click.clicked() && action.is_none() {
        action = Some(TableAction::Select(task.id.clone()));
    }

    action
}
