use std::fmt::{self, Debug, Display};
use std::io;

use crate::tier::Tier;

/// Provides `SimError` and maps other errors to it
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    /// A parameter failed validation before the simulation started.
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// Rejection sampling of network edges hit its retry cap.
    NetworkExhausted {
        stage: String,
        attempts: usize,
    },
    /// Severity draws kept landing above the unit interval.
    SeverityRejection {
        tier: Tier,
        attempts: usize,
    },
    /// An event was scheduled before the current simulation time.
    InvalidTime {
        time: u64,
        current: u64,
    },
    SimError(String),
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<String> for SimError {
    fn from(error: String) -> Self {
        SimError::SimError(error)
    }
}

impl From<&str> for SimError {
    fn from(error: &str) -> Self {
        SimError::SimError(error.to_string())
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::IoError(error) => Some(error),
            SimError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::IoError(error) => write!(f, "I/O error: {error}"),
            SimError::JsonError(error) => write!(f, "invalid JSON: {error}"),
            SimError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            SimError::NetworkExhausted { stage, attempts: 0 } => write!(
                f,
                "network construction failed in {stage}: more links requested than distinct pairs"
            ),
            SimError::NetworkExhausted { stage, attempts } => write!(
                f,
                "network construction failed in {stage}: no valid pair after {attempts} draws"
            ),
            SimError::SeverityRejection { tier, attempts } => write!(
                f,
                "no {tier} severity within [0, 1] after {attempts} draws"
            ),
            SimError::InvalidTime { time, current } => {
                write!(f, "cannot schedule event at {time}s, current time is {current}s")
            }
            SimError::SimError(message) => write!(f, "Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let error = SimError::invalid("population", "must be positive");
        assert_eq!(
            error.to_string(),
            "invalid parameter `population`: must be positive"
        );
    }

    #[test]
    fn converts_io_errors() {
        let error: SimError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(error, SimError::IoError(_)));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn converts_strings() {
        let error: SimError = "boom".into();
        assert_eq!(error.to_string(), "Error: boom");
    }
}
