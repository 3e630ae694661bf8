use crate::audio::AudioPayload;
use crate::config::{Config, DeploymentEnv};
use crate::error::PipelineError;
use crate::transcript::TranscriptSegment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Fixed placeholder shown when transcription degrades: the recording itself
/// is already retained client-side and stays playable.
pub const TRANSCRIPTION_UNAVAILABLE: &str = "Recording succeeded, transcription unavailable";

/// Multipart field name expected by the transcription service
const UPLOAD_FIELD: &str = "file";
const UPLOAD_FILENAME: &str = "recording.mp4";
const UPLOAD_MIME: &str = "audio/mp4";

/// Result of exactly one upload attempt
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Success(Vec<TranscriptSegment>),
    /// Service unreachable or returned a failure status; carries the fixed
    /// placeholder message
    ServiceUnavailable(&'static str),
    /// Service reachable but the exchange went wrong locally (malformed
    /// response, packaging error)
    Failure(String),
}

/// Seam between the session controller and the transcription service
#[async_trait]
pub trait Transcriber {
    /// Uploads one finalized recording. Always resolves to an outcome, never
    /// a hard error: a lost transcription must not look like lost audio.
    async fn upload(&self, audio: &AudioPayload) -> UploadOutcome;
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcript: Option<Vec<TranscriptSegment>>,
}

/// HTTP upload client for the transcription service
pub struct HttpTranscriber {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl HttpTranscriber {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    /// Endpoint for this call. The deployment environment is read fresh on
    /// every call, never cached across environment changes.
    fn endpoint(&self) -> String {
        resolve_endpoint(
            self.config.deployment_env(),
            &self.config.production_base_url,
            &self.config.transcribe_path,
            &self.config.dev_transcribe_url,
        )
    }

    fn build_form(&self, audio: &AudioPayload) -> Result<Form, PipelineError> {
        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(UPLOAD_FILENAME)
            .mime_str(UPLOAD_MIME)
            .map_err(|e| {
                PipelineError::InternalProcessing(format!("Failed to build multipart body: {}", e))
            })?;

        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn upload(&self, audio: &AudioPayload) -> UploadOutcome {
        let endpoint = self.endpoint();
        tracing::info!(
            endpoint = %endpoint,
            bytes = audio.len(),
            "Uploading recording for transcription"
        );

        let form = match self.build_form(audio) {
            Ok(form) => form,
            Err(e) => {
                tracing::error!("Upload packaging failed: {}", e);
                return UploadOutcome::Failure(e.to_string());
            }
        };

        // Tier one: any transport failure degrades, it is never a hard error.
        let response = match self.client.post(&endpoint).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = PipelineError::ServiceUnavailable(e.to_string());
                tracing::warn!("{}", err);
                return UploadOutcome::ServiceUnavailable(TRANSCRIPTION_UNAVAILABLE);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let err = PipelineError::ServiceUnavailable(format!(
                    "failed to read response body: {}",
                    e
                ));
                tracing::warn!("{}", err);
                return UploadOutcome::ServiceUnavailable(TRANSCRIPTION_UNAVAILABLE);
            }
        };

        outcome_from_response(status, &body)
    }
}

/// Map one service response onto the three-way outcome.
///
/// Non-success statuses degrade to the placeholder; a success status with a
/// missing or malformed transcript field is a response-validation failure
/// (tier two), caught here rather than propagated.
fn outcome_from_response(status: StatusCode, body: &str) -> UploadOutcome {
    if !status.is_success() {
        tracing::warn!(status = %status, "Transcription service returned failure status");
        return UploadOutcome::ServiceUnavailable(TRANSCRIPTION_UNAVAILABLE);
    }

    match parse_transcript(body) {
        Ok(segments) => {
            tracing::info!(segments = segments.len(), "Transcription received");
            UploadOutcome::Success(segments)
        }
        Err(e) => {
            tracing::error!("Transcription response rejected: {}", e);
            UploadOutcome::Failure(e.to_string())
        }
    }
}

/// Response-validation tier: success body must carry the transcript field.
fn parse_transcript(body: &str) -> Result<Vec<TranscriptSegment>, PipelineError> {
    let response: TranscribeResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;

    response.transcript.ok_or_else(|| {
        PipelineError::InvalidResponse("response missing transcript field".to_string())
    })
}

/// Pick the endpoint for one call: relative path on the production origin in
/// a production deployment, fixed local development endpoint otherwise.
fn resolve_endpoint(env: DeploymentEnv, base_url: &str, path: &str, dev_url: &str) -> String {
    match env {
        DeploymentEnv::Production => format!("{}{}", base_url.trim_end_matches('/'), path),
        DeploymentEnv::Development => dev_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_yields_segments_in_wire_order() {
        let body = r#"{"transcript":[
            {"speaker":"A","start":0.0,"end":1.2,"text":"hello"},
            {"speaker":"B","start":1.2,"end":2.0,"text":"hi"}
        ]}"#;

        let outcome = outcome_from_response(StatusCode::OK, body);
        match outcome {
            UploadOutcome::Success(segments) => {
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[0].speaker, "A");
                assert_eq!(segments[0].text, "hello");
                assert_eq!(segments[1].speaker, "B");
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn missing_transcript_field_is_a_failure_not_a_panic() {
        let outcome = outcome_from_response(StatusCode::OK, "{}");
        match outcome {
            UploadOutcome::Failure(detail) => assert!(detail.contains("transcript")),
            other => panic!("expected Failure, got {:?}", other),
        }
    }

    #[test]
    fn non_json_body_is_a_failure() {
        assert!(matches!(
            outcome_from_response(StatusCode::OK, "<html>oops</html>"),
            UploadOutcome::Failure(_)
        ));
    }

    #[test]
    fn failure_status_degrades_to_placeholder() {
        let outcome = outcome_from_response(StatusCode::SERVICE_UNAVAILABLE, "gateway down");
        assert_eq!(
            outcome,
            UploadOutcome::ServiceUnavailable(TRANSCRIPTION_UNAVAILABLE)
        );
    }

    #[test]
    fn endpoint_follows_deployment_env() {
        let prod = resolve_endpoint(
            DeploymentEnv::Production,
            "https://brainbridge.app/",
            "/api/transcribe",
            "http://localhost:5001/api/transcribe",
        );
        assert_eq!(prod, "https://brainbridge.app/api/transcribe");

        let dev = resolve_endpoint(
            DeploymentEnv::Development,
            "https://brainbridge.app",
            "/api/transcribe",
            "http://localhost:5001/api/transcribe",
        );
        assert_eq!(dev, "http://localhost:5001/api/transcribe");
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_service_unavailable() {
        let config = Config {
            // Discard port, nothing listens here
            dev_transcribe_url: "http://127.0.0.1:9/api/transcribe".to_string(),
            upload_timeout_secs: 2,
            ..Config::default()
        };
        let transcriber = HttpTranscriber::new(Arc::new(config)).unwrap();

        let outcome = transcriber.upload(&AudioPayload::new(vec![0u8; 64])).await;
        assert_eq!(
            outcome,
            UploadOutcome::ServiceUnavailable(TRANSCRIPTION_UNAVAILABLE)
        );
    }
}
