use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AltEarthError {
    #[error("Invalid value for {field}: {value} (allowed range {min} to {max})")]
    InvalidParameter {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Region '{0}' not found")]
    UnknownRegion(String),
    #[error("Baseline data unavailable: {0}")]
    DataUnavailable(String),
    #[error("Cache entry is corrupt: {0}")]
    CacheCorruption(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AltEarthError {
    /// Stable name of the error class, used in error response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AltEarthError::InvalidParameter { .. } => "InvalidParameter",
            AltEarthError::UnknownRegion(_) => "UnknownRegion",
            AltEarthError::DataUnavailable(_) => "DataUnavailable",
            AltEarthError::CacheCorruption(_) => "CacheCorruption",
            AltEarthError::Config(_) => "ConfigError",
        }
    }

    /// Whether the caller supplied something unusable (as opposed to an internal failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AltEarthError::InvalidParameter { .. } | AltEarthError::UnknownRegion(_)
        )
    }
}

/// Convenience type for `Result<T, AltEarthError>`.
pub type AltEarthResult<T> = Result<T, AltEarthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_names_field_and_range() {
        let err = AltEarthError::InvalidParameter {
            field: "rainfall_delta".to_string(),
            value: -51.0,
            min: -50.0,
            max: 30.0,
        };
        let message = err.to_string();
        assert!(message.contains("rainfall_delta"));
        assert!(message.contains("-51"));
        assert!(message.contains("-50 to 30"));
        assert_eq!(err.kind(), "InvalidParameter");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_internal_errors_are_not_client_errors() {
        assert!(!AltEarthError::DataUnavailable("offline".into()).is_client_error());
        assert!(!AltEarthError::CacheCorruption("bad".into()).is_client_error());
        assert_eq!(
            AltEarthError::UnknownRegion("atlantis".into()).kind(),
            "UnknownRegion"
        );
    }
}
