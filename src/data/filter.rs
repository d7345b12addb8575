use super::model::{TreatmentDataset, TreatmentRecord};

// ---------------------------------------------------------------------------
// Filter predicates: rating floor + treated-teeth range
// ---------------------------------------------------------------------------

pub const DEFAULT_RATING_MIN: i64 = 3;
pub const DEFAULT_TEETH_RANGE: (i64, i64) = (4, 10);

/// The active filter conditions, driven by the sidebar sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicates {
    /// Lowest patient rating still shown (slider domain 1–5).
    pub rating_min: i64,
    /// Inclusive range of treated teeth.
    pub teeth_range: (i64, i64),
}

impl Default for Predicates {
    fn default() -> Self {
        Predicates {
            rating_min: DEFAULT_RATING_MIN,
            teeth_range: DEFAULT_TEETH_RANGE,
        }
    }
}

/// Return indices of records that pass all predicates, in dataset order.
///
/// Both range bounds are inclusive. A record with a missing rating or teeth
/// count fails the corresponding predicate. No match yields an empty view,
/// never an error.
pub fn apply(dataset: &TreatmentDataset, predicates: &Predicates) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| passes(rec, predicates))
        .map(|(i, _)| i)
        .collect()
}

fn passes(rec: &TreatmentRecord, predicates: &Predicates) -> bool {
    let (lo, hi) = predicates.teeth_range;
    rec.patient_rating
        .is_some_and(|r| r >= predicates.rating_min)
        && rec.number_of_teeth.is_some_and(|t| t >= lo && t <= hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TreatmentRecord;

    fn record(id: &str, rating: Option<i64>, teeth: Option<i64>) -> TreatmentRecord {
        TreatmentRecord {
            treatment_id: id.to_string(),
            patient_rating: rating,
            doctor_rating: Some(5),
            number_of_teeth: teeth,
            treatment_duration_sec: Some(1000.0),
            setup_duration_sec: Some(200.0),
            interruptions: Some(0),
            errors: Some(0),
        }
    }

    fn fixture() -> TreatmentDataset {
        TreatmentDataset::from_records(vec![
            record("T-001", Some(5), Some(4)),  // passes defaults
            record("T-002", Some(2), Some(6)),  // rating below floor
            record("T-003", Some(3), Some(10)), // passes, both bounds inclusive
            record("T-004", Some(4), Some(11)), // teeth above range
            record("T-005", None, Some(7)),     // missing rating fails
            record("T-006", Some(4), None),     // missing teeth fails
            record("T-007", Some(3), Some(4)),  // passes
        ])
        .unwrap()
    }

    #[test]
    fn default_predicates_select_the_hand_computed_subset() {
        let ds = fixture();
        let indices = apply(&ds, &Predicates::default());
        let ids: Vec<&str> = indices
            .iter()
            .map(|&i| ds.records[i].treatment_id.as_str())
            .collect();
        assert_eq!(ids, ["T-001", "T-003", "T-007"]);
    }

    #[test]
    fn output_is_an_order_preserving_subsequence_satisfying_all_predicates() {
        let ds = fixture();
        let predicates = Predicates {
            rating_min: 2,
            teeth_range: (4, 11),
        };
        let indices = apply(&ds, &predicates);

        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        for &i in &indices {
            let rec = &ds.records[i];
            assert!(rec.patient_rating.unwrap() >= predicates.rating_min);
            let teeth = rec.number_of_teeth.unwrap();
            assert!((4..=11).contains(&teeth));
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let ds = fixture();
        let predicates = Predicates::default();
        assert_eq!(apply(&ds, &predicates), apply(&ds, &predicates));
    }

    #[test]
    fn no_match_yields_an_empty_view() {
        let ds = fixture();
        let indices = apply(
            &ds,
            &Predicates {
                rating_min: 5,
                teeth_range: (30, 32),
            },
        );
        assert!(indices.is_empty());
    }
}
