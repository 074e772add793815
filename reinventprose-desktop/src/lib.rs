//! The ReinventProse desktop shell.
//!
//! Everything that touches the database or writes files lives in
//! `reinventprose_core`; this crate owns the window, the panes and dialogs,
//! settings, and logging.

pub mod settings;
pub mod ui;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "reinventprose=info";

/// Installs the log subscriber. Records emitted through the `log` facade,
/// including the core library's, are forwarded to it.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if let Err(e) = result {
        eprintln!("logging already initialised: {e}");
    }
}

/// Opens the library and runs the window until it closes.
///
/// A library that cannot be opened stops start-up with an error message.
pub fn run() -> Result<(), String> {
    init_logging();
    log::info!(
        "Starting {} {}",
        reinventprose_core::APP_NAME,
        reinventprose_core::APP_VERSION
    );

    let paths = settings::ConfigPaths::user();
    let settings = settings::load_settings_from(&paths.settings_file);
    let database = settings.resolved_database_path();
    let session = reinventprose_core::Session::open(&database).map_err(|e| {
        let message = format!("Could not open the library at {}: {e}", database.display());
        log::error!("{message}");
        message
    })?;
    log::info!("Opened library {}", database.display());

    ui::app::run(session, settings, paths).map_err(|e| e.to_string())
}
