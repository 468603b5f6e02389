use thiserror::Error;

/// Failures surfaced by the orientation engine.
///
/// Geometric degeneracies never show up here; they are absorbed by the
/// algebra. Only malformed input from the host is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("pointer position is not finite: ({x}, {y})")]
    NonFinitePointer { x: f64, y: f64 },
    #[error("invalid projection parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
