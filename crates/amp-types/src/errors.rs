use thiserror::Error;

/// Main error type for the Amplify system
#[derive(Error, Debug)]
pub enum AmpError {
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failures reported by a scoring collaborator.
///
/// Callers can tell "there is no model for this" apart from "the model could
/// not run right now" and "the configuration cannot be fed to the model".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("No fitted model available for {target}")]
    ModelUnavailable { target: String },

    #[error("Transient scoring failure: {message}")]
    Transient { message: String },

    #[error("Malformed input for parameter {parameter}: {message}")]
    MalformedInput { parameter: String, message: String },
}

impl ScoringError {
    pub fn unavailable(target: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            target: target.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn malformed(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Optimizer-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("Invalid base configuration: {reason}")]
    InvalidBaseConfiguration { reason: ScoringError },
}

/// Result type alias for Amplify operations
pub type AmpResult<T> = Result<T, AmpError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::AmpError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::AmpError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ScoringError::malformed("num_hashtags", "expected a number");

        assert!(error.to_string().contains("Malformed input"));
        assert!(error.to_string().contains("num_hashtags"));
        assert!(error.to_string().contains("expected a number"));
    }

    #[test]
    fn test_error_conversion() {
        let scoring_error = ScoringError::unavailable("instagram/gen_z");
        let amp_error: AmpError = scoring_error.into();

        match amp_error {
            AmpError::Scoring(ScoringError::ModelUnavailable { target }) => {
                assert_eq!(target, "instagram/gen_z")
            }
            _ => panic!("Expected Scoring error"),
        }
    }

    #[test]
    fn test_invalid_base_wraps_reason() {
        let error = OptimizerError::InvalidBaseConfiguration {
            reason: ScoringError::transient("inference timed out"),
        };
        let message = AmpError::from(error).to_string();
        assert!(message.contains("Invalid base configuration"));
        assert!(message.contains("inference timed out"));
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid weight: {}", -1.0);
        assert!(matches!(validation_err, AmpError::Validation(_)));
        let config_err = config_error!("Missing required setting: {}", "AMP_MODELS_PATH");
        assert!(matches!(config_err, AmpError::Config(_)));
    }
}
