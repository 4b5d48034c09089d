//! Hand detection with rate-limited notifications.
//!
//! Frames go through a [`HandPipeline`](core::pipeline::HandPipeline): a
//! [`HandDetector`](platform::pose::HandDetector) finds hands, the
//! [`NotificationGate`](core::notification_gate::NotificationGate) lets at most one notification
//! through per cooldown period, and the [`Dispatcher`](core::dispatcher::Dispatcher) POSTs it to
//! the configured endpoint in the background.
//!
//! # Environment Variables
//!
//! * `API_ENDPOINT`: where notifications are sent. Overrides the config file; when neither sets
//!   it, notifications are skipped with a warning. May also be set in a `.env` file.
//! * `HANDWATCH_CONFIG`: path of the JSON config file (default `~/.handwatch/config.json`).
//! * `HANDWATCH_PYTHON_DIR`: directory holding the `hand_inference` Python module used by the
//!   `ml-pyo3` backend (default `./python`).
//! * `RUST_LOG`: log filter, applied on top of the defaults set by [`init_logger`].

use log::LevelFilter;

pub mod core;
pub mod models;
pub mod platform;

/// Initializes logging to *stderr*.
///
/// This crate and the calling binary log at *debug* level, everything else at *warn*. `RUST_LOG`
/// is applied afterwards. If a global logger is already registered, this does nothing.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter(Some(env!("CARGO_CRATE_NAME")), LevelFilter::Debug)
        .filter(Some("handwatch"), LevelFilter::Debug)
        .parse_default_env()
        .try_init()
        .ok();
}
