//! Error types for pair assignment
//!
//! Only configuration problems are errors. Data-integrity warnings, structural
//! infeasibility and internal consistency misses are logged and surface as
//! sentinel slots in the produced assignments instead.

/// Errors raised while configuring or running an assignment session
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("Invalid label filter pattern {pattern:?}: {source}")]
    InvalidLabelPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown pair mode: {0}")]
    UnknownPairMode(String),

    #[error("Unknown range filter: {0}")]
    UnknownRangeFilter(String),

    #[error("Unknown group mode: {0}")]
    UnknownGroupMode(String),

    #[error("No feature map has been provided")]
    MissingFeatureMap,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PairingError {
    /// Create an invalid configuration error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Configuration errors are fatal to the run and must not be retried
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::MissingFeatureMap | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, PairingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_pattern_error_names_the_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = PairingError::InvalidLabelPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().contains("\"(\""));
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_map_is_not_a_configuration_error() {
        assert!(!PairingError::MissingFeatureMap.is_configuration());
        assert!(PairingError::UnknownPairMode("zigzag".into()).is_configuration());
    }
}
