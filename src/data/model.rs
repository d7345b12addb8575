use std::collections::HashSet;
use std::fmt;

use anyhow::{bail, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// NumericColumn – the numeric fields every aggregation can address
// ---------------------------------------------------------------------------

/// The numeric columns of a treatment record, in source-file order.
///
/// `header()` returns the exact column name used by the data files, including
/// the `(sec)` unit suffixes, which are part of the name and must not be
/// stripped or reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    PatientRating,
    DoctorRating,
    NumberOfTeeth,
    TreatmentDuration,
    SetupDuration,
    Interruptions,
    Errors,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 7] = [
        NumericColumn::PatientRating,
        NumericColumn::DoctorRating,
        NumericColumn::NumberOfTeeth,
        NumericColumn::TreatmentDuration,
        NumericColumn::SetupDuration,
        NumericColumn::Interruptions,
        NumericColumn::Errors,
    ];

    /// Column name as it appears in the source file header.
    pub fn header(self) -> &'static str {
        match self {
            NumericColumn::PatientRating => "PatientRating",
            NumericColumn::DoctorRating => "DoctorRating",
            NumericColumn::NumberOfTeeth => "NumberOfTeeth",
            NumericColumn::TreatmentDuration => "TreatmentDuration(sec)",
            NumericColumn::SetupDuration => "SetupDuration(sec)",
            NumericColumn::Interruptions => "Interruptions",
            NumericColumn::Errors => "Errors",
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// TreatmentRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single treatment event.
///
/// Numeric fields are `Option` so that a missing cell survives loading and
/// surfaces as NaN in the aggregates instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentRecord {
    #[serde(rename = "TreatmentID")]
    pub treatment_id: String,
    #[serde(rename = "PatientRating")]
    pub patient_rating: Option<i64>,
    #[serde(rename = "DoctorRating")]
    pub doctor_rating: Option<i64>,
    #[serde(rename = "NumberOfTeeth")]
    pub number_of_teeth: Option<i64>,
    #[serde(rename = "TreatmentDuration(sec)")]
    pub treatment_duration_sec: Option<f64>,
    #[serde(rename = "SetupDuration(sec)")]
    pub setup_duration_sec: Option<f64>,
    #[serde(rename = "Interruptions")]
    pub interruptions: Option<i64>,
    #[serde(rename = "Errors")]
    pub errors: Option<i64>,
}

impl TreatmentRecord {
    /// Read a numeric column as `f64`, with NaN standing in for missing cells.
    pub fn value(&self, column: NumericColumn) -> f64 {
        fn int(v: Option<i64>) -> f64 {
            v.map(|i| i as f64).unwrap_or(f64::NAN)
        }
        match column {
            NumericColumn::PatientRating => int(self.patient_rating),
            NumericColumn::DoctorRating => int(self.doctor_rating),
            NumericColumn::NumberOfTeeth => int(self.number_of_teeth),
            NumericColumn::TreatmentDuration => self.treatment_duration_sec.unwrap_or(f64::NAN),
            NumericColumn::SetupDuration => self.setup_duration_sec.unwrap_or(f64::NAN),
            NumericColumn::Interruptions => int(self.interruptions),
            NumericColumn::Errors => int(self.errors),
        }
    }

    /// Domain checks applied at load time. Missing cells are fine; present
    /// values must lie in the documented ranges.
    fn validate(&self) -> Result<()> {
        if self.treatment_id.trim().is_empty() {
            bail!("empty TreatmentID");
        }
        for (name, rating) in [
            ("PatientRating", self.patient_rating),
            ("DoctorRating", self.doctor_rating),
        ] {
            if let Some(r) = rating {
                if !(1..=10).contains(&r) {
                    bail!("{name} {r} outside the 1-10 scale");
                }
            }
        }
        if let Some(teeth) = self.number_of_teeth {
            if teeth < 1 {
                bail!("NumberOfTeeth {teeth} is not positive");
            }
        }
        for (name, count) in [
            ("Interruptions", self.interruptions),
            ("Errors", self.errors),
        ] {
            if let Some(c) = count {
                if c < 0 {
                    bail!("{name} {c} is negative");
                }
            }
        }
        for (name, dur) in [
            ("TreatmentDuration(sec)", self.treatment_duration_sec),
            ("SetupDuration(sec)", self.setup_duration_sec),
        ] {
            if let Some(d) = dur {
                if d.is_finite() && d <= 0.0 {
                    bail!("{name} {d} is not positive");
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TreatmentDataset – the complete loaded snapshot
// ---------------------------------------------------------------------------

/// The full dataset as loaded, immutable for the rest of the session.
#[derive(Debug, Clone)]
pub struct TreatmentDataset {
    /// All treatment records, in file order.
    pub records: Vec<TreatmentRecord>,
}

impl TreatmentDataset {
    /// Validate the loaded rows and build the snapshot.
    ///
    /// Fails on any out-of-domain value or on a duplicate `TreatmentID`
    /// (ids are unique across the snapshot).
    pub fn from_records(records: Vec<TreatmentRecord>) -> Result<Self> {
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        for (row, rec) in records.iter().enumerate() {
            rec.validate()
                .map_err(|e| e.context(format!("row {row}")))?;
            if !seen.insert(rec.treatment_id.clone()) {
                bail!("row {row}: duplicate TreatmentID '{}'", rec.treatment_id);
            }
        }
        Ok(TreatmentDataset { records })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observed min/max of `NumberOfTeeth`, for bounding the teeth slider.
    /// Falls back to the full adult dentition when no value is present.
    pub fn teeth_bounds(&self) -> (i64, i64) {
        let mut bounds: Option<(i64, i64)> = None;
        for teeth in self.records.iter().filter_map(|r| r.number_of_teeth) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(teeth), hi.max(teeth)),
                None => (teeth, teeth),
            });
        }
        bounds.unwrap_or((1, 32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, teeth: Option<i64>) -> TreatmentRecord {
        TreatmentRecord {
            treatment_id: id.to_string(),
            patient_rating: Some(4),
            doctor_rating: Some(5),
            number_of_teeth: teeth,
            treatment_duration_sec: Some(1200.0),
            setup_duration_sec: Some(300.0),
            interruptions: Some(0),
            errors: Some(1),
        }
    }

    #[test]
    fn missing_cell_reads_as_nan() {
        let rec = record("T1", None);
        assert!(rec.value(NumericColumn::NumberOfTeeth).is_nan());
        assert_eq!(rec.value(NumericColumn::PatientRating), 4.0);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = TreatmentDataset::from_records(vec![record("T1", Some(4)), record("T1", Some(6))])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate TreatmentID"));
    }

    #[test]
    fn out_of_scale_rating_is_rejected() {
        let mut bad = record("T1", Some(4));
        bad.patient_rating = Some(11);
        assert!(TreatmentDataset::from_records(vec![bad]).is_err());
    }

    #[test]
    fn teeth_bounds_track_observed_values() {
        let ds = TreatmentDataset::from_records(vec![
            record("T1", Some(3)),
            record("T2", None),
            record("T3", Some(12)),
        ])
        .unwrap();
        assert_eq!(ds.teeth_bounds(), (3, 12));
    }
}
