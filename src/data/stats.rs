use std::collections::BTreeMap;

use super::model::{NumericColumn, TreatmentDataset};
use super::DataError;

// ---------------------------------------------------------------------------
// Aggregation layer
//
// Every function here is a pure function of (dataset, view indices) and
// returns a plain structure ready for rendering. Undefined quantities (mean
// of nothing, correlation of a constant column) come back as NaN, never as an
// error. The only fallible call is `radar_vector`, which reports a missing
// treatment id.
// ---------------------------------------------------------------------------

/// Rating code dropped from exactly two views: the rating distribution and
/// the duration-vs-teeth scatter. A reporting convention of the source data;
/// every other aggregate keeps these rows.
pub const SENTINEL_RATING: i64 = 6;

pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Indicators shown on the radar chart, in spoke order.
pub const RADAR_INDICATORS: [NumericColumn; 5] = [
    NumericColumn::PatientRating,
    NumericColumn::DoctorRating,
    NumericColumn::Errors,
    NumericColumn::Interruptions,
    NumericColumn::NumberOfTeeth,
];

/// Columns compared by the paired box plot.
pub const RATING_COLUMNS: [NumericColumn; 2] =
    [NumericColumn::PatientRating, NumericColumn::DoctorRating];

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Per-column summary in the shape of a `describe()` table row.
/// All fields except `count` are NaN when undefined.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summaries for all numeric columns over the view.
pub fn describe(
    dataset: &TreatmentDataset,
    indices: &[usize],
) -> Vec<(NumericColumn, ColumnSummary)> {
    NumericColumn::ALL
        .iter()
        .map(|&col| {
            let mut values = finite_column_values(dataset, indices, col);
            values.sort_by(f64::total_cmp);
            let summary = ColumnSummary {
                count: values.len(),
                mean: mean(&values),
                std: sample_std(&values),
                min: values.first().copied().unwrap_or(f64::NAN),
                q25: percentile(&values, 0.25),
                median: percentile(&values, 0.5),
                q75: percentile(&values, 0.75),
                max: values.last().copied().unwrap_or(f64::NAN),
            };
            (col, summary)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// KPI metrics
// ---------------------------------------------------------------------------

/// The headline metric row. Means over an empty view are NaN.
#[derive(Debug, Clone, Copy)]
pub struct Kpis {
    pub treatments: usize,
    pub mean_interruptions: f64,
    pub mean_patient_rating: f64,
    pub mean_doctor_rating: f64,
}

pub fn kpis(dataset: &TreatmentDataset, indices: &[usize]) -> Kpis {
    let mean_of = |col| mean(&finite_column_values(dataset, indices, col));
    Kpis {
        treatments: indices.len(),
        mean_interruptions: mean_of(NumericColumn::Interruptions),
        mean_patient_rating: mean_of(NumericColumn::PatientRating),
        mean_doctor_rating: mean_of(NumericColumn::DoctorRating),
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over the finite values of `column`.
///
/// Always `bins` bins regardless of view size; the last bin includes its
/// upper edge. No finite values → empty sequence.
pub fn histogram(
    dataset: &TreatmentDataset,
    indices: &[usize],
    column: NumericColumn,
    bins: usize,
) -> Vec<HistogramBin> {
    let values = finite_column_values(dataset, indices, column);
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        // All values identical: give the single occupied bin a visible width.
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in &values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Symmetric matrix of pairwise Pearson coefficients over all numeric
/// columns. `values[i][j]` correlates `columns[i]` with `columns[j]`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<f64>>,
}

/// Pairwise-complete Pearson correlation: each cell uses only the rows where
/// both columns have a value. Fewer than two such rows, or a zero-variance
/// column, yields a NaN cell.
pub fn correlation_matrix(dataset: &TreatmentDataset, indices: &[usize]) -> CorrelationMatrix {
    let columns: Vec<NumericColumn> = NumericColumn::ALL.to_vec();
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|&col| column_values(dataset, indices, col))
        .collect();

    let values = (0..columns.len())
        .map(|i| {
            (0..columns.len())
                .map(|j| pearson(&series[i], &series[j]))
                .collect()
        })
        .collect();

    CorrelationMatrix { columns, values }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    let n = pairs.len() as f64;
    if n < 2.0 {
        return f64::NAN;
    }

    let mx = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let my = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in &pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    let denom = (vx * vy).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    cov / denom
}

// ---------------------------------------------------------------------------
// Scatter views
// ---------------------------------------------------------------------------

/// Which columns a scatter view plots and decorates with.
#[derive(Debug, Clone, Copy)]
pub struct ScatterSpec {
    pub x: NumericColumn,
    pub y: NumericColumn,
    /// Column mapped to point colour, if any.
    pub color: Option<NumericColumn>,
    /// Column mapped to point size, if any.
    pub size: Option<NumericColumn>,
    /// Extra columns carried along for hover text.
    pub hover: &'static [NumericColumn],
    /// Drop rows whose patient rating equals [`SENTINEL_RATING`].
    pub exclude_sentinel: bool,
}

impl ScatterSpec {
    /// Treatment duration against treated teeth, coloured by patient rating.
    /// The one view that drops sentinel-rated rows.
    pub fn duration_vs_teeth() -> Self {
        ScatterSpec {
            x: NumericColumn::NumberOfTeeth,
            y: NumericColumn::TreatmentDuration,
            color: Some(NumericColumn::PatientRating),
            size: None,
            hover: &[NumericColumn::DoctorRating, NumericColumn::Interruptions],
            exclude_sentinel: true,
        }
    }

    /// Interruptions against errors, coloured by doctor rating, sized by
    /// patient rating.
    pub fn interruptions_vs_errors() -> Self {
        ScatterSpec {
            x: NumericColumn::Interruptions,
            y: NumericColumn::Errors,
            color: Some(NumericColumn::DoctorRating),
            size: Some(NumericColumn::PatientRating),
            hover: &[],
            exclude_sentinel: false,
        }
    }

    /// Setup duration against treatment duration, undecorated.
    pub fn setup_vs_treatment() -> Self {
        ScatterSpec {
            x: NumericColumn::SetupDuration,
            y: NumericColumn::TreatmentDuration,
            color: None,
            size: None,
            hover: &[],
            exclude_sentinel: false,
        }
    }
}

/// One plotted point with its decorations. `color`/`size` are NaN when the
/// spec maps no column to them.
#[derive(Debug, Clone)]
pub struct ScatterPoint {
    pub treatment_id: String,
    pub x: f64,
    pub y: f64,
    pub color: f64,
    pub size: f64,
    pub hover: Vec<(NumericColumn, f64)>,
}

pub fn scatter_pairs(
    dataset: &TreatmentDataset,
    indices: &[usize],
    spec: &ScatterSpec,
) -> Vec<ScatterPoint> {
    indices
        .iter()
        .map(|&i| &dataset.records[i])
        .filter(|rec| !(spec.exclude_sentinel && rec.patient_rating == Some(SENTINEL_RATING)))
        .map(|rec| ScatterPoint {
            treatment_id: rec.treatment_id.clone(),
            x: rec.value(spec.x),
            y: rec.value(spec.y),
            color: spec.color.map(|c| rec.value(c)).unwrap_or(f64::NAN),
            size: spec.size.map(|c| rec.value(c)).unwrap_or(f64::NAN),
            hover: spec.hover.iter().map(|&c| (c, rec.value(c))).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Radar vector
// ---------------------------------------------------------------------------

/// Indicator values for one treatment, as a closed polygon: the first entry
/// is repeated at the end, so the output has `indicators.len() + 1` entries.
///
/// Fails with [`DataError::NotFound`] when the id is not in the view.
pub fn radar_vector(
    dataset: &TreatmentDataset,
    indices: &[usize],
    treatment_id: &str,
    indicators: &[NumericColumn],
) -> Result<Vec<(String, f64)>, DataError> {
    let rec = indices
        .iter()
        .map(|&i| &dataset.records[i])
        .find(|rec| rec.treatment_id == treatment_id)
        .ok_or_else(|| DataError::NotFound(treatment_id.to_string()))?;

    let mut polygon: Vec<(String, f64)> = indicators
        .iter()
        .map(|&col| (col.header().to_string(), rec.value(col)))
        .collect();
    if let Some(first) = polygon.first().cloned() {
        polygon.push(first);
    }
    Ok(polygon)
}

// ---------------------------------------------------------------------------
// Rating distribution
// ---------------------------------------------------------------------------

/// Patient-rating counts, ascending by rating, with [`SENTINEL_RATING`]
/// removed. May be empty after the removal.
pub fn rating_distribution(dataset: &TreatmentDataset, indices: &[usize]) -> Vec<(i64, usize)> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &i in indices {
        if let Some(rating) = dataset.records[i].patient_rating {
            *counts.entry(rating).or_default() += 1;
        }
    }
    counts.remove(&SENTINEL_RATING);
    counts.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Paired box-plot data
// ---------------------------------------------------------------------------

/// Long-form melt: one `(column, value)` pair per (record, column)
/// combination, column-major. Missing cells stay in as NaN; nothing is
/// excluded here.
pub fn paired_boxplot_data(
    dataset: &TreatmentDataset,
    indices: &[usize],
    columns: &[NumericColumn],
) -> Vec<(NumericColumn, f64)> {
    columns
        .iter()
        .flat_map(|&col| {
            indices
                .iter()
                .map(move |&i| (col, dataset.records[i].value(col)))
        })
        .collect()
}

/// Five-number box summary with 1.5·IQR whiskers clamped to the most extreme
/// data points inside the fences. `None` when the values hold nothing finite.
#[derive(Debug, Clone, Copy)]
pub struct BoxStats {
    pub whisker_lo: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_hi: f64,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 0.25);
    let median = percentile(&sorted, 0.5);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;

    let whisker_lo = sorted
        .iter()
        .copied()
        .find(|&v| v >= lo_fence)
        .unwrap_or(q1);
    let whisker_hi = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= hi_fence)
        .unwrap_or(q3);

    Some(BoxStats {
        whisker_lo,
        q1,
        median,
        q3,
        whisker_hi,
    })
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

fn column_values(dataset: &TreatmentDataset, indices: &[usize], col: NumericColumn) -> Vec<f64> {
    indices.iter().map(|&i| dataset.records[i].value(col)).collect()
}

fn finite_column_values(
    dataset: &TreatmentDataset,
    indices: &[usize],
    col: NumericColumn,
) -> Vec<f64> {
    indices
        .iter()
        .map(|&i| dataset.records[i].value(col))
        .filter(|v| v.is_finite())
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN below two values.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
}

/// Linearly interpolated percentile over an ascending-sorted slice.
/// NaN on an empty slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TreatmentRecord;

    fn record(
        id: &str,
        rating: Option<i64>,
        teeth: Option<i64>,
        duration: Option<f64>,
    ) -> TreatmentRecord {
        TreatmentRecord {
            treatment_id: id.to_string(),
            patient_rating: rating,
            doctor_rating: Some(7),
            number_of_teeth: teeth,
            treatment_duration_sec: duration,
            setup_duration_sec: Some(300.0),
            interruptions: Some(1),
            errors: Some(0),
        }
    }

    fn fixture() -> (TreatmentDataset, Vec<usize>) {
        let ds = TreatmentDataset::from_records(vec![
            record("T-001", Some(3), Some(4), Some(1000.0)),
            record("T-002", Some(6), Some(6), Some(1500.0)), // sentinel rating
            record("T-003", Some(5), Some(8), Some(2000.0)),
            record("T-004", Some(3), Some(10), None),
            record("T-005", None, Some(5), Some(1200.0)),
        ])
        .unwrap();
        let indices = (0..ds.len()).collect();
        (ds, indices)
    }

    #[test]
    fn kpis_over_empty_view_report_nan_means() {
        let (ds, _) = fixture();
        let k = kpis(&ds, &[]);
        assert_eq!(k.treatments, 0);
        assert!(k.mean_interruptions.is_nan());
        assert!(k.mean_patient_rating.is_nan());
        assert!(k.mean_doctor_rating.is_nan());
    }

    #[test]
    fn kpis_average_only_present_values() {
        let (ds, indices) = fixture();
        let k = kpis(&ds, &indices);
        assert_eq!(k.treatments, 5);
        // Ratings 3, 6, 5, 3 — the missing one does not count.
        assert!((k.mean_patient_rating - 17.0 / 4.0).abs() < 1e-12);
        assert_eq!(k.mean_interruptions, 1.0);
    }

    #[test]
    fn describe_handles_empty_view() {
        let (ds, _) = fixture();
        for (_, summary) in describe(&ds, &[]) {
            assert_eq!(summary.count, 0);
            assert!(summary.mean.is_nan());
            assert!(summary.std.is_nan());
            assert!(summary.min.is_nan());
            assert!(summary.max.is_nan());
        }
    }

    #[test]
    fn describe_matches_hand_computed_quartiles() {
        let (ds, indices) = fixture();
        let table = describe(&ds, &indices);
        let (_, teeth) = table
            .iter()
            .find(|(c, _)| *c == NumericColumn::NumberOfTeeth)
            .unwrap();
        // Teeth: 4, 5, 6, 8, 10.
        assert_eq!(teeth.count, 5);
        assert_eq!(teeth.min, 4.0);
        assert_eq!(teeth.median, 6.0);
        assert_eq!(teeth.max, 10.0);
        assert_eq!(teeth.q25, 5.0);
        assert_eq!(teeth.q75, 8.0);
    }

    #[test]
    fn histogram_keeps_fixed_bin_count_and_total() {
        let (ds, indices) = fixture();
        let bins = histogram(&ds, &indices, NumericColumn::TreatmentDuration, 10);
        assert_eq!(bins.len(), 10);
        // Four finite durations; the max lands in the last (inclusive) bin.
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins.last().unwrap().count, 1);
    }

    #[test]
    fn histogram_of_empty_view_is_empty() {
        let (ds, _) = fixture();
        assert!(histogram(&ds, &[], NumericColumn::TreatmentDuration, 10).is_empty());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let (ds, indices) = fixture();
        let m = correlation_matrix(&ds, &indices);
        let n = m.columns.len();
        assert_eq!(n, NumericColumn::ALL.len());

        let teeth = m
            .columns
            .iter()
            .position(|&c| c == NumericColumn::NumberOfTeeth)
            .unwrap();
        assert!((m.values[teeth][teeth] - 1.0).abs() < 1e-12);
        for i in 0..n {
            for j in 0..n {
                let (a, b) = (m.values[i][j], m.values[j][i]);
                assert!(a.is_nan() && b.is_nan() || (a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn zero_variance_column_yields_nan_cells() {
        let (ds, indices) = fixture();
        let m = correlation_matrix(&ds, &indices);
        // Errors is 0 for every record.
        let errors = m
            .columns
            .iter()
            .position(|&c| c == NumericColumn::Errors)
            .unwrap();
        assert!(m.values[errors].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn duration_vs_teeth_scatter_drops_sentinel_rows() {
        let (ds, indices) = fixture();
        let points = scatter_pairs(&ds, &indices, &ScatterSpec::duration_vs_teeth());
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.treatment_id != "T-002"));
        // Hover fields ride along in the order the view declares them.
        assert_eq!(points[0].hover[0].0, NumericColumn::DoctorRating);
        assert_eq!(points[0].hover[1].0, NumericColumn::Interruptions);
    }

    #[test]
    fn other_scatters_keep_sentinel_rows() {
        let (ds, indices) = fixture();
        let points = scatter_pairs(&ds, &indices, &ScatterSpec::interruptions_vs_errors());
        assert_eq!(points.len(), 5);
        assert!(points.iter().any(|p| p.treatment_id == "T-002"));

        let plain = scatter_pairs(&ds, &indices, &ScatterSpec::setup_vs_treatment());
        assert!(plain.iter().all(|p| p.color.is_nan() && p.size.is_nan()));
    }

    #[test]
    fn radar_vector_closes_the_loop() {
        let (ds, indices) = fixture();
        let polygon = radar_vector(&ds, &indices, "T-003", &RADAR_INDICATORS).unwrap();
        assert_eq!(polygon.len(), RADAR_INDICATORS.len() + 1);
        assert_eq!(polygon.first(), polygon.last());
        assert_eq!(polygon[0].0, "PatientRating");
        assert_eq!(polygon[0].1, 5.0);
    }

    #[test]
    fn radar_vector_reports_missing_id() {
        let (ds, indices) = fixture();
        let err = radar_vector(&ds, &indices, "T-999", &RADAR_INDICATORS).unwrap_err();
        assert!(matches!(err, DataError::NotFound(id) if id == "T-999"));
    }

    #[test]
    fn rating_distribution_is_sorted_and_sentinel_free() {
        let (ds, indices) = fixture();
        let dist = rating_distribution(&ds, &indices);
        assert_eq!(dist, vec![(3, 2), (5, 1)]);
    }

    #[test]
    fn rating_distribution_may_be_empty_after_exclusion() {
        let ds = TreatmentDataset::from_records(vec![record(
            "T-001",
            Some(SENTINEL_RATING),
            Some(5),
            Some(900.0),
        )])
        .unwrap();
        assert!(rating_distribution(&ds, &[0]).is_empty());
    }

    #[test]
    fn boxplot_melt_is_long_form_column_major() {
        let (ds, indices) = fixture();
        let melted = paired_boxplot_data(&ds, &indices, &RATING_COLUMNS);
        assert_eq!(melted.len(), indices.len() * RATING_COLUMNS.len());
        assert!(melted[..indices.len()]
            .iter()
            .all(|(c, _)| *c == NumericColumn::PatientRating));
        // The missing patient rating stays in the melt as NaN.
        assert_eq!(melted.iter().filter(|(_, v)| v.is_nan()).count(), 1);
    }

    #[test]
    fn box_stats_clamps_whiskers_to_data() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.whisker_lo, 1.0);
        // 100 is beyond the upper fence; the whisker stops at 4.
        assert_eq!(stats.whisker_hi, 4.0);
        assert!(box_stats(&[f64::NAN]).is_none());
    }
}
