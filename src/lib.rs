//! Interactive analytics dashboard for robotic dental treatment reports.
//!
//! The data layer (load → snapshot → filter → aggregate) is UI-free and
//! fully testable; the `app`/`ui` modules render it with egui.
pub mod app;
pub mod color;
pub mod data;
pub mod state;
pub mod ui;
