use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::ai::{apply_actions, AiClient, AiRequest};
use crate::drag::DragController;
use crate::model::filter::{collect_hidden_ids, filter_tasks};
use crate::model::timeline::{visible_months, DEFAULT_LEAD_MONTHS, DEFAULT_MONTH_WIDTH_PX};
use crate::model::{ScheduleStore, Task, Timeline};
use crate::ui;

/// Main application state.
pub struct PlannerApp {
    pub store: ScheduleStore,
    pub drag: DragController,
    pub ai: AiClient,
    pub selected_task: Option<String>,
    pub filter_query: String,
    pub file_path: Option<PathBuf>,

    // Dialog state
    pub show_add_task: bool,
    pub show_ai_panel: bool,
    pub new_task_name: String,
    pub new_task_start_date: NaiveDate,
    pub new_task_end_date: NaiveDate,
    pub new_task_is_milestone: bool,

    // AI panel state
    pub ai_question: String,
    pub ai_pending: Option<AiRequest>,
    pub ai_error: Option<String>,

    // Chart scale
    pub month_width_px: f32,
    pub lead_months: u32,

    // Status message
    pub status_message: String,
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let today = Utc::now().date_naive();
        Self {
            store: ScheduleStore::new(Self::sample_schedule()),
            drag: DragController::default(),
            ai: AiClient::default(),
            selected_task: None,
            filter_query: String::new(),
            file_path: None,
            show_add_task: false,
            show_ai_panel: false,
            new_task_name: String::new(),
            new_task_start_date: today,
            new_task_end_date: today + Duration::days(7),
            new_task_is_milestone: false,
            ai_question: String::new(),
            ai_pending: None,
            ai_error: None,
            month_width_px: DEFAULT_MONTH_WIDTH_PX,
            lead_months: DEFAULT_LEAD_MONTHS,
            status_message: "Ready".to_string(),
        }
    }

    /// Generate a sample schedule for demonstration: one project root with
    /// nested phases, leaf activities, and milestones.
    fn sample_schedule() -> Vec<Task> {
        let day = |offset: i64| -> DateTime<Utc> {
            Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::days(offset)
        };
        let child = |id: &str, name: &str, start: i64, end: i64, parent: &str, order: i64| {
            let mut t = Task::new(id, name, day(start), day(end));
            t.parent_id = Some(parent.to_string());
            t.display_order = order;
            t
        };

        // ── Preconstruction ─────────────────────────────────────────
        let mut rfp = child("RFP", "Issue RFP", -40, -40, "PCN", 1);
        rfp.progress = 100;
        let mut int = child("INT", "Interview Selection", -38, -25, "PCN", 2);
        int.progress = 100;
        int.dependencies = Some(vec!["RFP".to_string()]);
        let mut awd = child("AWD", "Award Contract", -25, -25, "PCN", 3);
        awd.progress = 100;
        awd.dependencies = Some(vec!["INT".to_string()]);

        let mut pcn = child("PCN", "Preconstruction", -40, -25, "PRJ", 1);
        pcn.progress = 100;
        pcn.children = Some(vec![rfp, int, awd]);

        // ── Procurement ─────────────────────────────────────────────
        let mut stl = child("STL", "Steel", -24, -10, "PRC", 1);
        stl.progress = 100;
        let mut lit = child("LIT", "Lighting", -24, 5, "PRC", 2);
        lit.progress = 70;

        let mut prc = child("PRC", "Procurement", -24, 5, "PRJ", 2);
        prc.progress = 85;
        prc.children = Some(vec![stl, lit]);

        // ── Construction ────────────────────────────────────────────
        let mut dem = child("DEM", "Drywall Demo", -10, -3, "CON", 1);
        dem.progress = 100;
        let mut frm = child("FRM", "Framing", -3, 14, "CON", 2);
        frm.progress = 30;
        frm.dependencies = Some(vec!["DEM".to_string()]);
        let mut pdu = child("PDU", "PDU Startup", 16, 16, "CON", 3);
        pdu.dependencies = Some(vec!["FRM".to_string()]);

        let mut con = child("CON", "Construction", -10, 16, "PRJ", 3);
        con.progress = 45;
        con.children = Some(vec![dem, frm, pdu]);

        // ── Commissioning ───────────────────────────────────────────
        let dhc = child("DHC", "Data Hall CX", 17, 24, "CMS", 1);
        let mut cor = child("COR", "CX Corrections", 20, 30, "CMS", 2);
        cor.dependencies = Some(vec!["DHC".to_string()]);

        let mut cms = child("CMS", "Commissioning", 17, 30, "PRJ", 4);
        cms.children = Some(vec![dhc, cor]);

        let mut prj = Task::new("PRJ", "Data Hall Retrofit", day(-40), day(30));
        prj.progress = 60;
        prj.display_order = 1;
        prj.children = Some(vec![pcn, prc, con, cms]);

        vec![prj]
    }

    // --- File operations ---

    pub fn new_schedule(&mut self) {
        self.store.replace(Vec::new());
        self.file_path = None;
        self.selected_task = None;
        self.status_message = "New schedule created".to_string();
    }

    pub fn open_schedule(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Schedule", &["json"])
            .pick_file()
        {
            match crate::io::load_schedule(&path) {
                Ok(tasks) => {
                    self.store.replace(tasks);
                    self.file_path = Some(path);
                    self.selected_task = None;
                    self.status_message = "Schedule loaded".to_string();
                }
                Err(e) => {
                    self.status_message = format!("Error loading: {}", e);
                }
            }
        }
    }

    pub fn save_schedule(&mut self) {
        if let Some(path) = self.file_path.clone() {
            match crate::io::save_schedule(self.store.tasks(), &path) {
                Ok(()) => self.status_message = "Schedule saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        } else {
            self.save_schedule_as();
        }
    }

    pub fn save_schedule_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Schedule", &["json"])
            .set_file_name("schedule.json")
            .save_file()
        {
            self.file_path = Some(path.clone());
            match crate::io::save_schedule(self.store.tasks(), &path) {
                Ok(()) => self.status_message = "Schedule saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.store.tasks().is_empty() {
            self.status_message = "Nothing to export — schedule has no tasks".to_string();
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("schedule.csv")
            .save_file()
        {
            match crate::io::csv_export::export_csv(self.store.tasks(), &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} tasks to CSV", count);
                }
                Err(e) => {
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    // --- Task operations ---

    pub fn create_task_from_dialog(&mut self) {
        let name = if self.new_task_name.is_empty() {
            "New Task".to_string()
        } else {
            self.new_task_name.clone()
        };
        let start = self.new_task_start_date.and_time(NaiveTime::MIN).and_utc();
        let end = if self.new_task_is_milestone {
            start
        } else {
            self.new_task_end_date
                .max(self.new_task_start_date)
                .and_time(NaiveTime::MIN)
                .and_utc()
        };

        let mut task = Task::new(uuid::Uuid::new_v4().to_string(), name, start, end);
        match self.selected_task.clone() {
            Some(parent_id) if self.store.find(&parent_id).is_some() => {
                let siblings = self
                    .store
                    .find(&parent_id)
                    .and_then(|p| p.children.as_ref().map(Vec::len))
                    .unwrap_or(0);
                task.display_order = siblings as i64 + 1;
                task.parent_id = Some(parent_id.clone());
                self.store.add(task, &parent_id);
            }
            _ => {
                task.display_order = self.store.tasks().len() as i64 + 1;
                self.store.add_root(task);
            }
        }
        self.reset_dialog_fields();
        self.status_message = "Task added".to_string();
    }

    pub fn delete_task(&mut self, id: &str) {
        if self.store.remove(id) {
            self.status_message = "Task deleted".to_string();
        } else {
            self.status_message = format!("No task with id {}", id);
        }
        // Selection may have been inside the removed subtree.
        if let Some(selected) = &self.selected_task {
            if self.store.find(selected).is_none() {
                self.selected_task = None;
            }
        }
    }

    fn reset_dialog_fields(&mut self) {
        let today = Utc::now().date_naive();
        self.new_task_name = String::new();
        self.new_task_start_date = today;
        self.new_task_end_date = today + Duration::days(7);
        self.new_task_is_milestone = false;
    }

    // --- AI assistant ---

    pub fn start_ai_request(&mut self) {
        self.ai_error = None;
        self.ai_pending = Some(self.ai.process_schedule(self.store.tasks(), &self.ai_question));
        self.status_message = "Processing schedule with AI...".to_string();
    }

    fn poll_ai_request(&mut self) {
        let Some(pending) = &self.ai_pending else {
            return;
        };
        let Some(result) = pending.try_result() else {
            return;
        };
        self.ai_pending = None;
        match result {
            Ok(actions) => {
                let applied = apply_actions(&mut self.store, &actions);
                self.status_message = format!(
                    "AI applied {} of {} proposed edits",
                    applied,
                    actions.len()
                );
                self.ai_question.clear();
                self.show_ai_panel = false;
            }
            Err(err) => {
                // Surfaced, never retried; the tree is untouched by failures.
                self.ai_error = Some(err.to_string());
                self.status_message = "AI request failed".to_string();
            }
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_schedule();
        }

        self.poll_ai_request();
        if self.ai_pending.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_sub())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Tasks: {}", self.store.count()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Derive this frame's shared view state once: the filtered forest
        // and the hidden-id set feed both panels.
        let filtered = filter_tasks(self.store.tasks(), &self.filter_query);
        let hidden = collect_hidden_ids(&filtered);
        let rows = ui::visible_rows(&filtered, &hidden);
        let months = visible_months(self.store.tasks(), self.lead_months);
        let timeline = Timeline::spanning(self.store.tasks(), self.lead_months, self.month_width_px);

        // Left panel: task table
        let mut table_action = ui::task_table::TableAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(340.0)
            .min_width(240.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(6.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                table_action =
                    ui::task_table::show_task_table(&rows, self.selected_task.as_deref(), ui);
            });

        // Central panel: the chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let mut chart_changed = false;
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            let Some(timeline) = &timeline else {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("No tasks — add one to start a schedule")
                            .color(ui::theme::TEXT_DIM),
                    );
                });
                return;
            };
            let interaction = ui::chart::show_chart(
                &rows,
                &months,
                timeline,
                &mut self.drag,
                &mut self.store,
                &mut self.selected_task,
                ui,
            );
            chart_changed = interaction.changed;
        });

        if chart_changed {
            if let Some(selected) = &self.selected_task {
                if let Some(task) = self.store.find(selected) {
                    self.status_message = format!(
                        "Updated '{}' ({} → {})",
                        task.name,
                        task.start.format("%Y-%m-%d"),
                        task.end.format("%Y-%m-%d")
                    );
                } else {
                    self.status_message = "Timeline updated".to_string();
                }
            } else {
                self.status_message = "Timeline updated".to_string();
            }
        }

        match table_action {
            ui::task_table::TableAction::Select(id) => {
                self.selected_task = Some(id);
            }
            ui::task_table::TableAction::Delete(id) => {
                self.delete_task(&id);
            }
            ui::task_table::TableAction::ToggleCollapse(id) => {
                self.store.toggle_children(&id);
            }
            ui::task_table::TableAction::Reorder { selected, target } => {
                match self.store.reorder(&selected, &target) {
                    Ok(()) => {
                        self.status_message = format!("Moved {} under {}", selected, target);
                    }
                    Err(err) => {
                        self.status_message = err.to_string();
                    }
                }
            }
            ui::task_table::TableAction::Add => {
                self.show_add_task = true;
            }
            ui::task_table::TableAction::None => {}
        }

        // Dialogs
        if self.show_add_task {
            ui::dialogs::show_add_task_dialog(self, ctx);
        }
        if self.show_ai_panel {
            ui::dialogs::show_ai_panel(self, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::{count_tasks, find_task_by_id};

    #[test]
    fn sample_schedule_is_a_consistent_forest() {
        let forest = PlannerApp::sample_schedule();
        assert_eq!(count_tasks(&forest), 15);

        // Every child's back-link matches its containing parent.
        fn check(tasks: &[Task], parent: Option<&str>) {
            for task in tasks {
                assert_eq!(task.parent_id.as_deref(), parent, "task {}", task.id);
                if let Some(children) = &task.children {
                    check(children, Some(&task.id));
                }
            }
        }
        check(&forest, None);

        // Milestones are zero-duration.
        for id in ["RFP", "AWD", "PDU"] {
            assert!(find_task_by_id(&forest, id).unwrap().is_milestone());
        }
    }
}
