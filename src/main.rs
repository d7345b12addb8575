use std::path::PathBuf;

use dentodash::app::DentoDashApp;
use dentodash::data;
use dentodash::state::AppState;
use eframe::egui;

/// Data file loaded at startup when no path is given on the command line.
const DEFAULT_DATA_PATH: &str = "treatments.csv";

fn main() -> eframe::Result {
    env_logger::init();

    let data_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

    let mut state = AppState::default();
    match data::store::snapshot(&data_path) {
        Ok(snapshot) => {
            log::info!(
                "Loaded {} treatments from {}",
                snapshot.len(),
                data_path.display()
            );
            state.set_dataset(snapshot);
        }
        // A present-but-unreadable source is fatal; a missing default file
        // just starts the app empty, ready for File → Open.
        Err(err) if data_path.exists() => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        Err(err) => {
            log::warn!("No dataset at {}: {err}", data_path.display());
            state.status_message = Some(format!("No data loaded ({})", data_path.display()));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DentoDash – Treatment Analytics",
        options,
        Box::new(|_cc| Ok(Box::new(DentoDashApp::new(state)))),
    )
}
