use thiserror::Error;

/// Failures surfaced by the transcript pipeline
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("no subtitles or captions available for video {0}")]
    NoTranscriptAvailable(String),

    /// Per-track fetch failure; the assembler advances past these
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("error fetching transcript: {0}")]
    Unexpected(String),
}

/// Failures from the language model once a transcript exists
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("request to {model} failed: {reason}")]
    Request { model: String, reason: String },

    #[error("{model} returned {status}: {body}")]
    Status { model: String, status: u16, body: String },

    #[error("unexpected response from {model}")]
    Response { model: String },
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no API key configured for language model")]
    NoApiKey,

    #[error("no language model answered (tried: {})", .tried.join(", "))]
    NoModelAvailable { tried: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_model_available_lists_candidates() {
        let err = ConnectionError::NoModelAvailable {
            tried: vec!["gemini-2.5-flash".to_string(), "gemini-2.0-flash".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no language model answered (tried: gemini-2.5-flash, gemini-2.0-flash)"
        );
    }

    #[test]
    fn test_transcript_errors_are_distinct_messages() {
        let invalid = TranscriptError::InvalidUrl("not a url".to_string());
        let missing = TranscriptError::NoTranscriptAvailable("abc".to_string());
        assert_eq!(invalid.to_string(), "invalid YouTube URL: not a url");
        assert_eq!(missing.to_string(), "no subtitles or captions available for video abc");
    }
}
