use std::path::Path;

use anyhow::{bail, Context, Result};

use super::model::{TreatmentDataset, TreatmentRecord};
use super::DataError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a treatment dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – semicolon-separated table with a header row (the export format
///             of the treatment robots)
/// * `.json` – records-oriented array, `[{ "TreatmentID": ..., ... }, ...]`
///
/// Any read, parse, or validation failure is a [`DataError::Unavailable`];
/// there is no partial or degraded load.
pub fn load_file(path: &Path) -> Result<TreatmentDataset, DataError> {
    load_any(path).map_err(DataError::Unavailable)
}

fn load_any(path: &Path) -> Result<TreatmentDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the exact column names, `;` as separator:
///
/// ```text
/// TreatmentID;PatientRating;DoctorRating;NumberOfTeeth;TreatmentDuration(sec);SetupDuration(sec);Interruptions;Errors
/// T-001;4;5;6;1432.0;311.5;0;1
/// ```
///
/// The `(sec)` suffixes are part of the column names. Empty cells load as
/// missing values, not as errors.
fn load_csv(path: &Path) -> Result<TreatmentDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .context("opening CSV")?;

    let headers = reader.headers().context("reading CSV headers")?;
    if !headers.iter().any(|h| h == "TreatmentID") {
        bail!("CSV missing 'TreatmentID' column");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<TreatmentRecord>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }

    TreatmentDataset::from_records(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "TreatmentID": "T-001",
///     "PatientRating": 4,
///     "DoctorRating": 5,
///     "NumberOfTeeth": 6,
///     "TreatmentDuration(sec)": 1432.0,
///     "SetupDuration(sec)": 311.5,
///     "Interruptions": 0,
///     "Errors": 1
///   },
///   ...
/// ]
/// ```
///
/// `null` cells load as missing values.
fn load_json(path: &Path) -> Result<TreatmentDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<TreatmentRecord> = serde_json::from_str(&text).context("parsing JSON")?;
    TreatmentDataset::from_records(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str = "TreatmentID;PatientRating;DoctorRating;NumberOfTeeth;TreatmentDuration(sec);SetupDuration(sec);Interruptions;Errors";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_semicolon_csv_with_unit_suffix_headers() {
        let file = write_csv(&["T-001;4;5;6;1432.0;311.5;0;1", "T-002;2;3;10;2200.5;400.0;2;0"]);
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].treatment_id, "T-001");
        assert_eq!(ds.records[0].treatment_duration_sec, Some(1432.0));
        assert_eq!(ds.records[1].interruptions, Some(2));
    }

    #[test]
    fn empty_cells_become_missing_values() {
        let file = write_csv(&["T-001;;5;6;1432.0;;0;1"]);
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.records[0].patient_rating, None);
        assert_eq!(ds.records[0].setup_duration_sec, None);
        assert_eq!(ds.records[0].doctor_rating, Some(5));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = load_file(Path::new("/no/such/treatments.csv")).unwrap_err();
        assert!(matches!(err, DataError::Unavailable(_)));
    }

    #[test]
    fn duplicate_ids_are_unavailable() {
        let file = write_csv(&["T-001;4;5;6;1432.0;311.5;0;1", "T-001;3;4;8;900.0;250.0;1;0"]);
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate TreatmentID"));
    }

    #[test]
    fn loads_records_oriented_json() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"[{{"TreatmentID":"T-001","PatientRating":4,"DoctorRating":5,
                 "NumberOfTeeth":6,"TreatmentDuration(sec)":1432.0,
                 "SetupDuration(sec)":null,"Interruptions":0,"Errors":1}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].setup_duration_sec, None);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("treatments.parquet")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
