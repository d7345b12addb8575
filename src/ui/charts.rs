use std::collections::BTreeMap;

use eframe::egui::{
    self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui, Vec2,
};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};

use crate::color::{self, RatingColors};
use crate::data::model::{NumericColumn, TreatmentDataset};
use crate::data::stats::{self, ScatterPoint, ScatterSpec};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the dashboard sections enabled by the sidebar toggles, in the
/// report's fixed order. All branching on toggles lives here; the
/// aggregation functions themselves are unconditional.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data file to view the report  (File → Open…)");
        });
        return;
    };
    let indices = &state.visible_indices;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Robotic dental treatment report");
            ui.label(format!("{} treatments shown after filtering", indices.len()));
            ui.separator();

            let toggles = state.toggles;
            if toggles.data_table {
                section(ui, "Data preview", |ui| data_table(ui, dataset, indices));
            }
            if toggles.stats_table {
                section(ui, "Descriptive statistics", |ui| {
                    stats_table(ui, dataset, indices)
                });
            }
            if toggles.kpi {
                section(ui, "Key metrics", |ui| kpi_row(ui, dataset, indices));
            }
            if toggles.duration_histogram {
                section(ui, "Treatment durations", |ui| {
                    duration_histogram(ui, dataset, indices)
                });
            }
            if toggles.correlation {
                section(ui, "Correlation between variables", |ui| {
                    correlation_heatmap(ui, dataset, indices)
                });
            }
            if toggles.duration_vs_teeth {
                section(ui, "Duration vs teeth treated", |ui| {
                    scatter_chart(
                        ui,
                        "scatter_teeth",
                        stats::scatter_pairs(dataset, indices, &ScatterSpec::duration_vs_teeth()),
                        &ScatterSpec::duration_vs_teeth(),
                        state.rating_colors.as_ref(),
                    )
                });
            }
            if toggles.interruptions_vs_errors {
                section(ui, "Interruptions and errors vs satisfaction", |ui| {
                    scatter_chart(
                        ui,
                        "scatter_satisfaction",
                        stats::scatter_pairs(
                            dataset,
                            indices,
                            &ScatterSpec::interruptions_vs_errors(),
                        ),
                        &ScatterSpec::interruptions_vs_errors(),
                        state.rating_colors.as_ref(),
                    )
                });
            }
            if toggles.setup_vs_treatment {
                section(ui, "Setup vs treatment duration", |ui| {
                    scatter_chart(
                        ui,
                        "scatter_setup",
                        stats::scatter_pairs(dataset, indices, &ScatterSpec::setup_vs_treatment()),
                        &ScatterSpec::setup_vs_treatment(),
                        state.rating_colors.as_ref(),
                    )
                });
            }
            if toggles.radar {
                section(ui, "Indicator radar per treatment", |ui| {
                    radar_chart(ui, dataset, indices, state.selected_treatment.as_deref())
                });
            }
            if toggles.rating_pie {
                section(ui, "Patient rating distribution", |ui| {
                    rating_pie(ui, dataset, indices)
                });
            }
            if toggles.rating_boxplots {
                section(ui, "Patient vs doctor ratings", |ui| {
                    rating_boxplots(ui, dataset, indices)
                });
            }
        });
}

fn section(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    ui.add_space(10.0);
    ui.strong(title);
    ui.add_space(4.0);
    add_contents(ui);
}

/// Compact column labels for table headers and chart axes.
fn short(col: NumericColumn) -> &'static str {
    match col {
        NumericColumn::PatientRating => "Patient",
        NumericColumn::DoctorRating => "Doctor",
        NumericColumn::NumberOfTeeth => "Teeth",
        NumericColumn::TreatmentDuration => "Treat (s)",
        NumericColumn::SetupDuration => "Setup (s)",
        NumericColumn::Interruptions => "Interrupts",
        NumericColumn::Errors => "Errors",
    }
}

fn fmt(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "–".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    egui::ScrollArea::vertical()
        .id_salt("data_table_scroll")
        .max_height(240.0)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("data_table")
                .striped(true)
                .min_col_width(60.0)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("TreatmentID");
                    for col in NumericColumn::ALL {
                        ui.strong(short(col));
                    }
                    ui.end_row();

                    for &i in indices {
                        let rec = &dataset.records[i];
                        ui.label(&rec.treatment_id);
                        for col in NumericColumn::ALL {
                            ui.label(fmt(rec.value(col)));
                        }
                        ui.end_row();
                    }
                });
        });
}

fn stats_table(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let table = stats::describe(dataset, indices);

    egui::Grid::new("stats_table")
        .striped(true)
        .min_col_width(60.0)
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for (col, _) in &table {
                ui.strong(short(*col));
            }
            ui.end_row();

            let rows: [(&str, fn(&stats::ColumnSummary) -> String); 8] = [
                ("count", |s| s.count.to_string()),
                ("mean", |s| fmt(s.mean)),
                ("std", |s| fmt(s.std)),
                ("min", |s| fmt(s.min)),
                ("25%", |s| fmt(s.q25)),
                ("50%", |s| fmt(s.median)),
                ("75%", |s| fmt(s.q75)),
                ("max", |s| fmt(s.max)),
            ];
            for (name, cell) in rows {
                ui.strong(name);
                for (_, summary) in &table {
                    ui.label(cell(summary));
                }
                ui.end_row();
            }
        });
}

fn kpi_row(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let kpis = stats::kpis(dataset, indices);
    ui.columns(4, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total treatments", kpis.treatments.to_string());
        metric(&mut cols[1], "Mean interruptions", fmt(kpis.mean_interruptions));
        metric(&mut cols[2], "Mean patient rating", fmt(kpis.mean_patient_rating));
        metric(&mut cols[3], "Mean doctor rating", fmt(kpis.mean_doctor_rating));
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.label(label);
    ui.label(egui::RichText::new(value).size(22.0).strong());
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

fn duration_histogram(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let bins = stats::histogram(
        dataset,
        indices,
        NumericColumn::TreatmentDuration,
        stats::DEFAULT_HISTOGRAM_BINS,
    );
    if bins.is_empty() {
        ui.label("No durations to display.");
        return;
    }

    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64).width((b.end - b.start) * 0.95)
        })
        .collect();

    Plot::new("duration_histogram")
        .height(240.0)
        .x_axis_label("TreatmentDuration(sec)")
        .y_axis_label("Treatments")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name("Treatments"));
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let matrix = stats::correlation_matrix(dataset, indices);

    egui::Grid::new("correlation_heatmap")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for &col in &matrix.columns {
                ui.small(short(col));
            }
            ui.end_row();

            for (i, &row_col) in matrix.columns.iter().enumerate() {
                ui.small(short(row_col));
                for (j, &col) in matrix.columns.iter().enumerate() {
                    let r = matrix.values[i][j];
                    let fill = color::correlation_color(r);
                    let (rect, response) =
                        ui.allocate_exact_size(Vec2::new(52.0, 24.0), Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, fill);
                    let text_color = if r.is_finite() && r.abs() > 0.5 {
                        Color32::WHITE
                    } else {
                        Color32::BLACK
                    };
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        fmt(r),
                        FontId::proportional(10.0),
                        text_color,
                    );
                    response.on_hover_text(format!("{} / {}: {}", row_col, col, fmt(r)));
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter views
// ---------------------------------------------------------------------------

fn scatter_chart(
    ui: &mut Ui,
    id: &str,
    points: Vec<ScatterPoint>,
    spec: &ScatterSpec,
    rating_colors: Option<&RatingColors>,
) {
    // One Points item per (colour, size) group; identical legend names merge.
    let mut groups: BTreeMap<(Option<i64>, Option<i64>), Vec<[f64; 2]>> = BTreeMap::new();
    for p in &points {
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        let color_key = p.color.is_finite().then(|| p.color as i64);
        let size_key = p.size.is_finite().then(|| p.size as i64);
        groups.entry((color_key, size_key)).or_default().push([p.x, p.y]);
    }

    let hover_points = points;
    let hover_spec = *spec;

    Plot::new(id.to_string())
        .height(260.0)
        .legend(Legend::default())
        .x_axis_label(spec.x.header())
        .y_axis_label(spec.y.header())
        .label_formatter(move |name, value: &PlotPoint| {
            scatter_hover(&hover_points, &hover_spec, name, value)
        })
        .show(ui, |plot_ui| {
            for ((color_key, size_key), positions) in groups {
                let color = match (color_key, rating_colors) {
                    (Some(rating), Some(colors)) => colors.color_for(rating),
                    _ => Color32::LIGHT_BLUE,
                };
                let radius = match size_key {
                    Some(size) => 2.0 + size as f32 * 0.7,
                    None => 3.0,
                };
                let mut item = Points::new(PlotPoints::from(positions))
                    .color(color)
                    .radius(radius);
                if let (Some(rating), Some(col)) = (color_key, hover_spec.color) {
                    item = item.name(format!("{} {rating}", short(col)));
                }
                plot_ui.points(item);
            }
        });
}

/// Hover text: the nearest point's id and hover columns when the cursor is
/// close to one, otherwise just the coordinates.
fn scatter_hover(points: &[ScatterPoint], spec: &ScatterSpec, name: &str, value: &PlotPoint) -> String {
    let finite: Vec<&ScatterPoint> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();

    let span = |f: fn(&ScatterPoint) -> f64| -> f64 {
        let lo = finite.iter().map(|p| f(p)).fold(f64::INFINITY, f64::min);
        let hi = finite.iter().map(|p| f(p)).fold(f64::NEG_INFINITY, f64::max);
        (hi - lo).max(1e-9)
    };
    let (x_span, y_span) = (span(|p| p.x), span(|p| p.y));

    let nearest = finite.iter().min_by(|a, b| {
        let da = ((a.x - value.x) / x_span).powi(2) + ((a.y - value.y) / y_span).powi(2);
        let db = ((b.x - value.x) / x_span).powi(2) + ((b.y - value.y) / y_span).powi(2);
        da.total_cmp(&db)
    });

    if let Some(p) = nearest {
        let dist = (((p.x - value.x) / x_span).powi(2) + ((p.y - value.y) / y_span).powi(2)).sqrt();
        if dist < 0.03 {
            let mut lines = vec![
                p.treatment_id.clone(),
                format!("{}: {}", spec.x.header(), fmt(p.x)),
                format!("{}: {}", spec.y.header(), fmt(p.y)),
            ];
            for (col, v) in &p.hover {
                lines.push(format!("{}: {}", col.header(), fmt(*v)));
            }
            return lines.join("\n");
        }
    }

    if name.is_empty() {
        format!("{:.1}, {:.1}", value.x, value.y)
    } else {
        format!("{name}\n{:.1}, {:.1}", value.x, value.y)
    }
}

// ---------------------------------------------------------------------------
// Radar chart
// ---------------------------------------------------------------------------

const RADAR_SCALE: f64 = 10.0;

fn radar_chart(
    ui: &mut Ui,
    dataset: &TreatmentDataset,
    indices: &[usize],
    selected: Option<&str>,
) {
    let Some(id) = selected else {
        ui.label("No treatment selected.");
        return;
    };
    let polygon = match stats::radar_vector(dataset, indices, id, &stats::RADAR_INDICATORS) {
        Ok(polygon) => polygon,
        Err(e) => {
            // The state keeps the selection inside the view; a stale frame
            // right after a filter change can still miss.
            ui.label(e.to_string());
            return;
        }
    };
    let spokes = polygon.len() - 1;

    // Spoke k sits at the angle of 12 o'clock minus k turns of the circle.
    let angle = |k: usize| -> f64 {
        std::f64::consts::FRAC_PI_2 - (k as f64 / spokes as f64) * std::f64::consts::TAU
    };
    let cartesian = |k: usize, r: f64| -> [f64; 2] { [r * angle(k).cos(), r * angle(k).sin()] };

    Plot::new("radar")
        .height(320.0)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .include_x(-RADAR_SCALE * 1.6)
        .include_x(RADAR_SCALE * 1.6)
        .include_y(-RADAR_SCALE * 1.3)
        .include_y(RADAR_SCALE * 1.3)
        .show(ui, |plot_ui| {
            // Rings every 2 units up to the rating scale maximum.
            for ring in (2..=RADAR_SCALE as usize).step_by(2) {
                let circle: PlotPoints = (0..=64)
                    .map(|s| {
                        let a = s as f64 / 64.0 * std::f64::consts::TAU;
                        [ring as f64 * a.cos(), ring as f64 * a.sin()]
                    })
                    .collect();
                plot_ui.line(Line::new(circle).color(Color32::from_gray(70)).width(0.5));
            }

            // Spokes with indicator labels just beyond the outer ring.
            for (k, (label, _)) in polygon.iter().take(spokes).enumerate() {
                let spoke: PlotPoints = vec![[0.0, 0.0], cartesian(k, RADAR_SCALE)].into();
                plot_ui.line(Line::new(spoke).color(Color32::from_gray(70)).width(0.5));
                let [x, y] = cartesian(k, RADAR_SCALE * 1.25);
                plot_ui.text(Text::new(
                    PlotPoint::new(x, y),
                    egui::RichText::new(label.as_str()).size(11.0),
                ));
            }

            // The closed indicator polygon itself.
            let outline: PlotPoints = polygon
                .iter()
                .enumerate()
                .map(|(k, (_, v))| cartesian(k % spokes, if v.is_finite() { *v } else { 0.0 }))
                .collect();
            plot_ui.polygon(
                Polygon::new(outline)
                    .stroke(Stroke::new(2.0, Color32::from_rgb(65, 105, 225)))
                    .name(id),
            );
        });
}

// ---------------------------------------------------------------------------
// Rating donut
// ---------------------------------------------------------------------------

fn rating_pie(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let distribution = stats::rating_distribution(dataset, indices);
    let total: usize = distribution.iter().map(|(_, count)| count).sum();
    if total == 0 {
        ui.label("No ratings to display.");
        return;
    }

    let palette = color::pastel_palette(distribution.len());
    let (response, painter) = ui.allocate_painter(Vec2::new(460.0, 260.0), Sense::hover());
    let rect = response.rect;
    let center = Pos2::new(rect.left() + 140.0, rect.center().y);
    let outer = 110.0_f32;
    let inner = outer * 0.3; // donut hole

    let mut start = -std::f32::consts::FRAC_PI_2;
    for (slice, ((rating, count), &fill)) in distribution.iter().zip(&palette).enumerate() {
        let frac = *count as f32 / total as f32;
        let sweep = frac * std::f32::consts::TAU;

        // Annular sector as a fan of quads; each quad is convex.
        let steps = ((sweep / 0.08).ceil() as usize).max(1);
        for s in 0..steps {
            let a0 = start + sweep * s as f32 / steps as f32;
            let a1 = start + sweep * (s + 1) as f32 / steps as f32;
            let at = |a: f32, r: f32| center + Vec2::new(a.cos(), a.sin()) * r;
            painter.add(Shape::convex_polygon(
                vec![at(a0, inner), at(a0, outer), at(a1, outer), at(a1, inner)],
                fill,
                Stroke::NONE,
            ));
        }

        let mid = start + sweep / 2.0;
        let label_pos = center + Vec2::new(mid.cos(), mid.sin()) * (inner + outer) / 2.0;
        painter.text(
            label_pos,
            Align2::CENTER_CENTER,
            format!("{:.1}%", frac * 100.0),
            FontId::proportional(11.0),
            Color32::BLACK,
        );

        // Legend row to the right of the donut.
        let row_y = rect.top() + 24.0 + slice as f32 * 20.0;
        let swatch = egui::Rect::from_min_size(
            Pos2::new(rect.left() + 290.0, row_y),
            Vec2::new(12.0, 12.0),
        );
        painter.rect_filled(swatch, 2.0, fill);
        painter.text(
            Pos2::new(swatch.right() + 6.0, swatch.center().y),
            Align2::LEFT_CENTER,
            format!("Rating {rating} – {count} ({:.1}%)", frac * 100.0),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );

        start += sweep;
    }
}

// ---------------------------------------------------------------------------
// Paired box plots
// ---------------------------------------------------------------------------

fn rating_boxplots(ui: &mut Ui, dataset: &TreatmentDataset, indices: &[usize]) {
    let melted = stats::paired_boxplot_data(dataset, indices, &stats::RATING_COLUMNS);

    let mut boxes = Vec::new();
    for (slot, &col) in stats::RATING_COLUMNS.iter().enumerate() {
        let values: Vec<f64> = melted
            .iter()
            .filter(|(c, _)| *c == col)
            .map(|(_, v)| *v)
            .collect();
        if let Some(s) = stats::box_stats(&values) {
            boxes.push(
                BoxElem::new(
                    slot as f64,
                    BoxSpread::new(s.whisker_lo, s.q1, s.median, s.q3, s.whisker_hi),
                )
                .name(col.header())
                .box_width(0.5),
            );
        }
    }
    if boxes.is_empty() {
        ui.label("No ratings to display.");
        return;
    }

    Plot::new("rating_boxplots")
        .height(260.0)
        .legend(Legend::default())
        .y_axis_label("Rating")
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name("Ratings"));
        });
}
