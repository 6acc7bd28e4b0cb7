// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod alerts;
pub mod api;
pub mod error;
pub mod metrics;
pub mod monitoring;
pub mod scheduler;
pub mod services;
pub mod store;

// Binary-side configuration and startup helpers.
pub mod cli;
pub mod config;
pub mod logging;
