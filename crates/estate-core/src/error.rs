use thiserror::Error;

/// Top-level error type for the estate assistant.
///
/// Subsystem crates either map into these variants directly or define their
/// own error type with a `From<EstateError>` conversion, so `?` works across
/// crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EstateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Transcoding error: {0}")]
    Transcoding(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for EstateError {
    fn from(err: toml::de::Error) -> Self {
        EstateError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EstateError {
    fn from(err: toml::ser::Error) -> Self {
        EstateError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EstateError {
    fn from(err: serde_json::Error) -> Self {
        EstateError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for estate operations.
pub type Result<T> = std::result::Result<T, EstateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EstateError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(EstateError, &str)> = vec![
            (
                EstateError::Dataset("bad json".to_string()),
                "Dataset error: bad json",
            ),
            (
                EstateError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                EstateError::Llm("model missing".to_string()),
                "LLM error: model missing",
            ),
            (
                EstateError::Transcoding("ffmpeg exited 1".to_string()),
                "Transcoding error: ffmpeg exited 1",
            ),
            (
                EstateError::Transcription("no speech".to_string()),
                "Transcription error: no speech",
            ),
            (
                EstateError::Synthesis("engine crashed".to_string()),
                "Synthesis error: engine crashed",
            ),
            (
                EstateError::Delivery("chat blocked".to_string()),
                "Delivery error: chat blocked",
            ),
            (
                EstateError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EstateError = io_err.into();
        assert!(matches!(err, EstateError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let converted: EstateError = err.unwrap_err().into();
        assert!(matches!(converted, EstateError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let converted: EstateError = err.unwrap_err().into();
        assert!(matches!(converted, EstateError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
