use egui::{menu, RichText, Ui};

use crate::app::PlannerApp;
use crate::ui::theme;

/// Render the top toolbar: file menu, schedule menu, and the right-aligned
/// search box and AI button.
pub fn show_toolbar(app: &mut PlannerApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_header()), |ui| {
            if ui.button("  New Schedule").clicked() {
                app.new_schedule();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_schedule();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_schedule();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_schedule_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Schedule  ").font(theme::font_header()), |ui| {
            if ui.button("  Add Task...").clicked() {
                app.show_add_task = true;
                ui.close_menu();
            }
            if ui.button("  AI Assistant...").clicked() {
                app.show_ai_panel = true;
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let ai_btn = egui::Button::new(
                RichText::new(format!("{} AI", egui_phosphor::regular::MAGIC_WAND))
                    .color(egui::Color32::WHITE)
                    .size(11.5),
            )
            .fill(theme::ACCENT)
            .rounding(egui::Rounding::same(4.0));
            if ui.add(ai_btn).clicked() {
                app.show_ai_panel = true;
            }

            ui.add_space(4.0);
            ui.add_sized(
                [180.0, 20.0],
                egui::TextEdit::singleline(&mut app.filter_query).hint_text("Search"),
            );
            ui.label(
                RichText::new(egui_phosphor::regular::MAGNIFYING_GLASS)
                    .size(12.0)
                    .color(theme::TEXT_DIM),
            );
        });
    });
}
