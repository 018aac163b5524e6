//! Catalog migrations.
//!
//! A migration regenerates artifacts for every item whose artifacts do not
//! satisfy a target format. Only one run is active per controller. Runs can
//! be stopped cooperatively between items and report live progress and an
//! ETA through [`MigrationController::status`].

mod config;
mod controller;
mod progress;
mod types;

pub use config::MigrationConfig;
pub use controller::MigrationController;
pub use progress::{estimate_seconds_remaining, percent_complete};
pub use types::{is_eligible, MigrationError, MigrationOptions, MigrationRun, MigrationState};
