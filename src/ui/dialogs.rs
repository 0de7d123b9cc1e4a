use egui::{Color32, Context, RichText, Window};

use crate::app::PlannerApp;
use crate::ui::theme;

/// Render the "Add Task" dialog. The new task lands under the currently
/// selected task, or as a new root when nothing is selected.
pub fn show_add_task_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("Add Task").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_DARK;
            ui.add_space(4.0);

            egui::Grid::new("add_task_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [220.0, 24.0],
                        egui::TextEdit::singleline(&mut app.new_task_name)
                            .hint_text("Task name...")
                            .text_color(theme::TEXT_PRIMARY),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.new_task_start_date)
                            .id_salt("dlg_dp_start"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.new_task_end_date)
                            .id_salt("dlg_dp_end"),
                    );
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut app.new_task_is_milestone, "Milestone");
                    ui.end_row();

                    ui.label(RichText::new("Parent").color(theme::TEXT_SECONDARY));
                    let parent_label = match &app.selected_task {
                        Some(id) => app
                            .store
                            .find(id)
                            .map(|t| t.name.clone())
                            .unwrap_or_else(|| id.clone()),
                        None => "(root)".to_string(),
                    };
                    ui.label(RichText::new(parent_label).color(theme::TEXT_DIM));
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let create_btn = egui::Button::new(RichText::new("Create").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], create_btn).clicked() {
                    app.create_task_from_dialog();
                    should_close = true;
                }
                if ui
                    .add_sized([80.0, 28.0], egui::Button::new("Cancel"))
                    .clicked()
                {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_add_task = false;
    }
}

/// Render the AI control panel: a question box, the in-flight spinner, and
/// whatever the service (or the network) had to say about the last attempt.
pub fn show_ai_panel(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("AI Assistant").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([380.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_DARK;
            ui.add_space(4.0);
            ui.label(
                RichText::new("Describe a change to the schedule; the assistant answers with edits.")
                    .size(11.0)
                    .color(theme::TEXT_SECONDARY),
            );
            ui.add_space(6.0);
            ui.add_sized(
                [360.0, 90.0],
                egui::TextEdit::multiline(&mut app.ai_question)
                    .hint_text("Enter your question here...")
                    .text_color(theme::TEXT_PRIMARY),
            );
            ui.add_space(6.0);

            if let Some(error) = &app.ai_error {
                ui.label(RichText::new(error).size(11.0).color(theme::TODAY_LINE));
                ui.add_space(4.0);
            }

            ui.horizontal(|ui| {
                if app.ai_pending.is_some() {
                    ui.add(egui::Spinner::new());
                    ui.label(
                        RichText::new("Processing schedule...")
                            .size(11.0)
                            .color(theme::TEXT_SECONDARY),
                    );
                } else {
                    let process_btn = egui::Button::new(
                        RichText::new(format!(
                            "Process Schedule {}",
                            egui_phosphor::regular::MAGIC_WAND
                        ))
                        .color(Color32::WHITE),
                    )
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                    if ui.add_sized([150.0, 28.0], process_btn).clicked() {
                        app.start_ai_request();
                    }
                }
                if ui
                    .add_sized([80.0, 28.0], egui::Button::new("Close"))
                    .clicked()
                {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        // Closing abandons any in-flight request along with the panel.
        app.show_ai_panel = false;
        app.ai_pending = None;
        app.ai_error = None;
    }
}
