//! # Pathway Tool
//!
//! A visual editor for biochemical reaction-network diagrams. Species nodes,
//! reactions, and compartments live on a pannable/zoomable canvas and are
//! created, moved, connected, locked, aliased, or deleted with pointer
//! gestures.
//!
//! ## Features
//! - Tool-driven canvas interaction: select/drag, plant nodes and
//!   compartments, connect species to reactions, erase, lock, alias
//! - Transactional preferences: a modal dialog edits a private configuration
//!   session that commits on Ok and discards on Cancel
//! - Composable pan/zoom viewport with live gesture transforms
//! - Pluggable blocking autolayout engine
//! - Canvas fitting after load and layout

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod constants;
mod layout;
mod pick;
mod types;
mod ui;
mod viewport;

// Re-export public types and functions
pub use config::*;
pub use layout::*;
pub use types::*;
pub use viewport::*;
use ui::PathwayApp;

/// Runs the pathway editor with default settings.
///
/// This function initializes the egui application window, restores any
/// persisted application state, attaches the persistent configuration root,
/// and starts the main event loop.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an
/// `eframe::Error` if initialization fails.
///
/// # Example
///
/// ```no_run
/// use pathway_tool::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Pathway Tool",
        options,
        Box::new(|cc| {
            let mut app = PathwayApp::default();
            if let Some(storage) = cc.storage {
                if let Some(json) = storage.get_string("app_state") {
                    match PathwayApp::from_json(&json) {
                        Ok(restored) => app = restored,
                        Err(err) => log::warn!("ignoring stale app state: {err}"),
                    }
                }
            }
            app.attach_persistent_config();
            Ok(Box::new(app))
        }),
    )
}
