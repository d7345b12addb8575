use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filters, chart toggles, radar selection
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Predicate sliders ----
            ui.strong("Minimum patient rating");
            ui.add(Slider::new(&mut state.predicates.rating_min, 1..=5));
            ui.add_space(6.0);

            let (teeth_lo, teeth_hi) = dataset.teeth_bounds();
            ui.strong("Teeth treated");
            ui.add(
                Slider::new(&mut state.predicates.teeth_range.0, teeth_lo..=teeth_hi)
                    .text("from"),
            );
            ui.add(
                Slider::new(&mut state.predicates.teeth_range.1, teeth_lo..=teeth_hi)
                    .text("to"),
            );
            // Keep the range well-formed when the sliders cross.
            if state.predicates.teeth_range.0 > state.predicates.teeth_range.1 {
                state.predicates.teeth_range.1 = state.predicates.teeth_range.0;
            }

            ui.separator();

            // ---- Chart visibility toggles ----
            ui.strong("Charts");
            let toggles = &mut state.toggles;
            ui.checkbox(&mut toggles.data_table, "Data table preview");
            ui.checkbox(&mut toggles.stats_table, "Descriptive statistics");
            ui.checkbox(&mut toggles.duration_histogram, "Treatment duration histogram");
            ui.checkbox(&mut toggles.correlation, "Correlation matrix");
            ui.checkbox(&mut toggles.duration_vs_teeth, "Duration vs teeth treated");
            ui.checkbox(&mut toggles.setup_vs_treatment, "Setup vs treatment duration");
            ui.checkbox(&mut toggles.interruptions_vs_errors, "Interruptions vs satisfaction");
            ui.checkbox(&mut toggles.rating_boxplots, "Patient vs doctor ratings");
            ui.checkbox(&mut toggles.kpi, "Key metrics (KPI)");
            ui.checkbox(&mut toggles.radar, "Radar per treatment");
            ui.checkbox(&mut toggles.rating_pie, "Patient rating distribution");

            ui.separator();

            // ---- Radar treatment selector (over the filtered view) ----
            ui.strong("Radar treatment");
            let visible_ids: Vec<String> = state
                .visible_indices
                .iter()
                .map(|&i| dataset.records[i].treatment_id.clone())
                .collect();
            let selected_label = state
                .selected_treatment
                .clone()
                .unwrap_or_else(|| "–".to_string());
            egui::ComboBox::from_id_salt("radar_treatment")
                .selected_text(selected_label)
                .show_ui(ui, |ui: &mut Ui| {
                    for id in &visible_ids {
                        let is_selected = state.selected_treatment.as_deref() == Some(id);
                        if ui.selectable_label(is_selected, id).clicked() {
                            state.selected_treatment = Some(id.clone());
                        }
                    }
                });
        });

    // Recompute the filtered view after any control changes.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} treatments loaded, {} match filters",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open treatment data")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV (semicolon separated)", &["csv"])
        .add_filter("JSON (records)", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!("Loaded {} treatments from {}", dataset.len(), path.display());
                state.set_dataset(Arc::new(dataset));
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
