use thiserror::Error;

/// Errors produced by the capture/upload pipeline.
///
/// None of these are fatal to the running session: each is caught at the
/// nearest boundary and converted into a user-visible status message plus a
/// logged diagnostic. The user can always start a new recording afterwards.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("Transcription service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response from transcription service: {0}")]
    InvalidResponse(String),

    #[error("Internal processing error: {0}")]
    InternalProcessing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_diagnostic_detail() {
        let cases = [
            (
                PipelineError::MicrophoneUnavailable("no input device".to_string()),
                "no input device",
            ),
            (
                PipelineError::ServiceUnavailable("connection refused".to_string()),
                "connection refused",
            ),
            (
                PipelineError::InvalidResponse("missing transcript".to_string()),
                "missing transcript",
            ),
            (
                PipelineError::InternalProcessing("multipart body".to_string()),
                "multipart body",
            ),
        ];

        for (err, detail) in cases {
            assert!(err.to_string().contains(detail));
        }
    }
}
