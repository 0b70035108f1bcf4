//! Error types for the chat core.

use reqwest::StatusCode;

/// Errors from the inference and account services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors from the dictation capability.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech capture is not supported in this environment")]
    Unsupported,
    #[error("dictation is already listening")]
    AlreadyListening,
    #[error("failed to start dictation program: {0}")]
    Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service returned 502 Bad Gateway: upstream down"
        );

        let err = ServiceError::Malformed("missing field `response`".to_string());
        assert_eq!(err.to_string(), "malformed response: missing field `response`");
    }

    #[test]
    fn test_speech_error_display() {
        assert_eq!(
            SpeechError::Unsupported.to_string(),
            "speech capture is not supported in this environment"
        );
        assert_eq!(
            SpeechError::AlreadyListening.to_string(),
            "dictation is already listening"
        );
    }

    #[test]
    fn test_speech_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: SpeechError = io.into();
        assert!(matches!(err, SpeechError::Spawn(_)));
        assert!(err.to_string().contains("no such file"));
    }
}
