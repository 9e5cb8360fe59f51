//! Crate-wide error types.

use thiserror::Error;

/// A single violated input constraint.
///
/// `field` is a dotted path into the scenario (e.g. `"battery.capacity_kwh"`),
/// so every rejected value can be reported back to the caller at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path.
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates an error for `field` with the given message.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Raised when an hourly series is built from data of the wrong length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} hourly values, got {actual}")]
pub struct SeriesError {
    pub expected: usize,
    pub actual: usize,
}

/// Errors surfaced by the simulation entry points and the CLI.
#[derive(Debug, Error)]
pub enum SimError {
    /// Input rejected at the boundary; the only class a simulation call returns.
    #[error("invalid input: {}", join_errors(.0))]
    InvalidInput(Vec<ConfigError>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_lists_every_field() {
        let err = SimError::InvalidInput(vec![
            ConfigError::new("pv.peak_kw", "must be > 0"),
            ConfigError::new("pv.tilt_deg", "must be in [0, 90]"),
        ]);
        let text = err.to_string();
        assert!(text.contains("pv.peak_kw: must be > 0"));
        assert!(text.contains("pv.tilt_deg"));
    }

    #[test]
    fn config_error_display_includes_field() {
        let e = ConfigError::new("preset", "unknown preset");
        assert_eq!(e.to_string(), "config error: preset: unknown preset");
    }
}
