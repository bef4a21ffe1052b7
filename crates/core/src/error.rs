use thiserror::Error;

/// Top-level error type shared by every perfwatch crate.
///
/// Runtime telemetry conditions (too few frames, a failed memory probe) are
/// never reported through this type; they resolve to `0.0` where they occur.
#[derive(Debug, Error)]
pub enum PerfError {
    #[error("config error: {0}")]
    Config(String),

    /// A construction parameter is out of range.  Raised once, up front.
    #[error("invalid `{field}`: {reason}")]
    Misconfiguration {
        field:  &'static str,
        reason: String,
    },
}

impl PerfError {
    pub fn misconfigured(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Misconfiguration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PerfError> = std::result::Result<T, E>;
