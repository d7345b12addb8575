use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::loader;
use super::model::TreatmentDataset;
use super::DataError;

// ---------------------------------------------------------------------------
// Process-wide snapshot holder
// ---------------------------------------------------------------------------

static SNAPSHOT: OnceCell<Arc<TreatmentDataset>> = OnceCell::new();

/// Load the session snapshot, at most once per process.
///
/// The first call reads and validates the file; every later call returns the
/// same `Arc` without touching the filesystem, regardless of the path passed.
/// Concurrent first calls block until the one winning load finishes. Nothing
/// mutates the snapshot afterwards, so sharing it needs no further locking.
pub fn snapshot(path: &Path) -> Result<Arc<TreatmentDataset>, DataError> {
    SNAPSHOT
        .get_or_try_init(|| loader::load_file(path).map(Arc::new))
        .cloned()
}

/// The already-loaded snapshot, if any.
pub fn get() -> Option<Arc<TreatmentDataset>> {
    SNAPSHOT.get().cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;

    use super::*;

    // One test exercises the whole holder: SNAPSHOT is process-global, so
    // splitting this into several #[test] fns would make them order-dependent.
    #[test]
    fn snapshot_is_memoized_without_altering_content() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "TreatmentID;PatientRating;DoctorRating;NumberOfTeeth;TreatmentDuration(sec);SetupDuration(sec);Interruptions;Errors"
        )
        .unwrap();
        writeln!(file, "T-001;4;5;6;1432.0;311.5;0;1").unwrap();
        writeln!(file, "T-002;2;3;10;2200.5;400.0;2;0").unwrap();
        file.flush().unwrap();

        assert!(get().is_none());

        let first = snapshot(file.path()).unwrap();
        let second = snapshot(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), second.len());

        let ids: HashSet<&str> = first.records.iter().map(|r| r.treatment_id.as_str()).collect();
        let ids_again: HashSet<&str> =
            second.records.iter().map(|r| r.treatment_id.as_str()).collect();
        assert_eq!(ids, ids_again);

        assert!(Arc::ptr_eq(&get().unwrap(), &first));
    }
}
