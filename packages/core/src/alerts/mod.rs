//! Alert evaluation and bounded alert history.

pub mod engine;

pub use engine::{AlertEngine, SharedAlertEngine, DEFAULT_ALERT_CAPACITY};
