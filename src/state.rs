use std::sync::Arc;

use crate::color::RatingColors;
use crate::data::filter::{self, Predicates};
use crate::data::model::TreatmentDataset;

// ---------------------------------------------------------------------------
// Chart visibility toggles
// ---------------------------------------------------------------------------

/// Which dashboard sections are rendered. Purely a presentation concern:
/// the aggregation functions are computed only when their section is shown,
/// but they never branch on these flags themselves.
#[derive(Debug, Clone, Copy)]
pub struct ChartToggles {
    pub data_table: bool,
    pub stats_table: bool,
    pub duration_histogram: bool,
    pub correlation: bool,
    pub duration_vs_teeth: bool,
    pub setup_vs_treatment: bool,
    pub interruptions_vs_errors: bool,
    pub rating_boxplots: bool,
    pub kpi: bool,
    pub radar: bool,
    pub rating_pie: bool,
}

impl Default for ChartToggles {
    fn default() -> Self {
        ChartToggles {
            data_table: false,
            stats_table: false,
            duration_histogram: true,
            correlation: true,
            duration_vs_teeth: true,
            setup_vs_treatment: true,
            interruptions_vs_errors: true,
            rating_boxplots: true,
            kpi: true,
            radar: true,
            rating_pie: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<TreatmentDataset>>,

    /// Active filter predicates.
    pub predicates: Predicates,

    /// Indices of records passing the current predicates (cached).
    pub visible_indices: Vec<usize>,

    /// Which dashboard sections are shown.
    pub toggles: ChartToggles,

    /// Treatment selected for the radar chart.
    pub selected_treatment: Option<String>,

    /// Rating value → colour, for the rating-coloured scatters.
    pub rating_colors: Option<RatingColors>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            predicates: Predicates::default(),
            visible_indices: Vec::new(),
            toggles: ChartToggles::default(),
            selected_treatment: None,
            rating_colors: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise predicates and colours.
    pub fn set_dataset(&mut self, dataset: Arc<TreatmentDataset>) {
        let (lo, hi) = dataset.teeth_bounds();
        let defaults = Predicates::default();
        self.predicates = Predicates {
            rating_min: defaults.rating_min,
            teeth_range: (
                defaults.teeth_range.0.clamp(lo, hi),
                defaults.teeth_range.1.clamp(lo, hi),
            ),
        };

        self.rating_colors = Some(RatingColors::new(
            dataset
                .records
                .iter()
                .flat_map(|r| [r.patient_rating, r.doctor_rating])
                .flatten(),
        ));

        self.dataset = Some(dataset);
        self.selected_treatment = None;
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` after a predicate change and keep the
    /// radar selection valid: a selection filtered out of the view falls back
    /// to the first visible treatment rather than erroring.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.visible_indices.clear();
            self.selected_treatment = None;
            return;
        };
        self.visible_indices = filter::apply(ds, &self.predicates);

        let still_visible = self.selected_treatment.as_deref().is_some_and(|sel| {
            self.visible_indices
                .iter()
                .any(|&i| ds.records[i].treatment_id == sel)
        });
        if !still_visible {
            self.selected_treatment = self
                .visible_indices
                .first()
                .map(|&i| ds.records[i].treatment_id.clone());
        }
    }
}
