use thiserror::Error;

/// Unified application error.
///
/// Every failure the binary can hit at startup or while serving ends up
/// here, so `main` has a single place to log and exit.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Server(err.to_string())
    }
}

impl From<prometheus::Error> for AppError {
    fn from(err: prometheus::Error) -> Self {
        AppError::Server(format!("metrics registry: {}", err))
    }
}
