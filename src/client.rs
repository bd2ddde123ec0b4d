use crate::error::ClientError;
use crate::gemini::{GeminiErrorResponse, GeminiRequest, GeminiResponse};
use crate::image::ImagePayload;
use crate::prompt;
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.5-flash";

/// One fully assembled conversion attempt. Immutable once built; one request
/// equals one attempt, there is no retry state.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    url: String,
    body: GeminiRequest,
}

/// Owns the credential and the single outbound call to the generateContent
/// endpoint. UI-agnostic: callers hand it an [`ImagePayload`] and render
/// whatever comes back.
#[derive(Debug)]
pub struct InferenceClient {
    http_client: Arc<reqwest::Client>,
    api_base: String,
    credential: Option<String>,
    in_flight: AtomicBool,
}

impl InferenceClient {
    pub fn new(http_client: Arc<reqwest::Client>, credential: Option<String>) -> Self {
        Self {
            http_client,
            api_base: GEMINI_API_BASE.to_string(),
            credential,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Point at a different endpoint. Only tests use this.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn build_target_url(&self, key: &str) -> String {
        let path = format!("models/{}:generateContent", MODEL);
        let base = &self.api_base;
        // Gemini takes the key as a URL query parameter, not a header.
        if base.ends_with('/') {
            format!("{}{}?key={}", base, path, key)
        } else {
            format!("{}/{}?key={}", base, path, key)
        }
    }

    /// Pair the image with the fixed instruction prompt and generation
    /// parameters. The credential check fires before the image check.
    pub fn build_request(&self, image: &ImagePayload) -> Result<InferenceRequest, ClientError> {
        let key = self
            .credential
            .as_deref()
            .ok_or(ClientError::MissingCredential)?;
        if image.is_empty() {
            return Err(ClientError::MissingImage);
        }

        Ok(InferenceRequest {
            url: self.build_target_url(key),
            body: GeminiRequest::single_turn(
                image.to_inline_data(),
                prompt::TRANSCRIPTION_PROMPT,
                prompt::generation_config(),
            ),
        })
    }

    /// Issue the call and classify the outcome. At most one call may be in
    /// flight; a second invocation is rejected without touching the network.
    /// The transcription comes back with leading/trailing whitespace trimmed
    /// and interior structure untouched.
    pub async fn execute(&self, request: &InferenceRequest) -> Result<String, ClientError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::Busy);
        }
        let _guard = FlightGuard(&self.in_flight);

        info!("Sending transcription request");
        let response = self
            .http_client
            .post(&request.url)
            .header("Content-Type", "application/json")
            .json(&request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Response status {}, {} bytes", status, body.len());

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiErrorResponse>(&body) {
                Ok(err) => err.error.message,
                Err(_) => format!("Error {}", status.as_u16()),
            };
            warn!("Request failed: {} ({})", message, status);
            return Err(classify_failure(status, message));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Server(format!("unexpected response body: {}", e)))?;

        match parsed.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(ClientError::EmptyTranscription),
        }
    }
}

/// Releases the in-flight slot when the attempt finishes, on every exit path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Best-effort mapping of a non-2xx outcome onto the error taxonomy. The
/// substring checks against the server's message text are a heuristic, not a
/// parse of the remote error contract; real deployments have been observed
/// returning ambiguous messages. Status codes win over substrings.
fn classify_failure(status: StatusCode, message: String) -> ClientError {
    if status == StatusCode::BAD_REQUEST {
        return ClientError::InvalidCredential(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ClientError::QuotaExceeded(message);
    }
    if message.contains("API_KEY_INVALID") || message.contains("invalid") || message.contains("400")
    {
        ClientError::InvalidCredential(message)
    } else if message.contains("QUOTA") || message.contains("429") {
        ClientError::QuotaExceeded(message)
    } else {
        ClientError::Server(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_KEY: &str = "AIzaSyabcdef1234567890";

    fn png_payload() -> ImagePayload {
        ImagePayload {
            bytes: b"\x89PNG\r\n\x1a\nfake".to_vec(),
            mime_type: "image/png".to_string(),
        }
    }

    fn client_for(api_base: &str) -> InferenceClient {
        InferenceClient::new(
            Arc::new(reqwest::Client::new()),
            Some(TEST_KEY.to_string()),
        )
        .with_api_base(api_base)
    }

    fn candidates_body(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn missing_credential_checked_before_missing_image() {
        let no_key = InferenceClient::new(Arc::new(reqwest::Client::new()), None);
        let empty = ImagePayload {
            bytes: Vec::new(),
            mime_type: "image/png".to_string(),
        };

        // Both are absent; the credential error must win.
        assert!(matches!(
            no_key.build_request(&empty),
            Err(ClientError::MissingCredential)
        ));

        let with_key = client_for(GEMINI_API_BASE);
        assert!(matches!(
            with_key.build_request(&empty),
            Err(ClientError::MissingImage)
        ));
    }

    #[test]
    fn request_url_carries_key_as_query_param() {
        let client = client_for("https://example.test/v1beta");
        let request = client.build_request(&png_payload()).unwrap();
        assert_eq!(
            request.url,
            format!(
                "https://example.test/v1beta/models/gemini-2.5-flash:generateContent?key={}",
                TEST_KEY
            )
        );
    }

    #[tokio::test]
    async fn successful_response_yields_trimmed_text() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), TEST_KEY.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidates_body("Hello"))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        let text = client.execute(&request).await.unwrap();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn interior_whitespace_is_preserved() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(candidates_body("  Dear Sam,\nTake two  tablets [?]\n"))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        let text = client.execute(&request).await.unwrap();
        // Only the ends are trimmed; line breaks and runs of spaces survive.
        assert_eq!(text, "Dear Sam,\nTake two  tablets [?]");
    }

    #[tokio::test]
    async fn whitespace_only_text_is_empty_transcription() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(candidates_body("  \n\t "))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        assert!(matches!(
            client.execute(&request).await,
            Err(ClientError::EmptyTranscription)
        ));
    }

    #[tokio::test]
    async fn missing_candidates_is_empty_transcription() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        assert!(matches!(
            client.execute(&request).await,
            Err(ClientError::EmptyTranscription)
        ));
    }

    #[tokio::test]
    async fn invalid_key_message_is_classified() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(json!({ "error": { "message": "API_KEY_INVALID" } }).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        match client.execute(&request).await {
            Err(ClientError::InvalidCredential(msg)) => assert_eq!(msg, "API_KEY_INVALID"),
            other => panic!("expected InvalidCredential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn status_429_is_quota_regardless_of_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body(json!({ "error": { "message": "something opaque" } }).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        assert!(matches!(
            client.execute(&request).await,
            Err(ClientError::QuotaExceeded(_))
        ));
    }

    #[tokio::test]
    async fn unclassified_failure_is_server_error_with_status_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();
        match client.execute(&request).await {
            Err(ClientError::Server(msg)) => assert_eq!(msg, "Error 503"),
            other => panic!("expected Server, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let request = client.build_request(&png_payload()).unwrap();
        assert!(matches!(
            client.execute(&request).await,
            Err(ClientError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn second_call_while_busy_is_rejected_without_network_traffic() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let request = client.build_request(&png_payload()).unwrap();

        // Simulate an outstanding call holding the slot.
        client.in_flight.store(true, Ordering::Release);
        assert!(matches!(
            client.execute(&request).await,
            Err(ClientError::Busy)
        ));
        mock.assert_async().await;

        // Finishing the outstanding call frees the slot again.
        client.in_flight.store(false, Ordering::Release);
        assert!(!client.in_flight.load(Ordering::Acquire));
    }

    #[test]
    fn substring_classification_without_status_signal() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            "the provided key is invalid".to_string(),
        );
        assert!(matches!(err, ClientError::InvalidCredential(_)));

        let err = classify_failure(
            StatusCode::FORBIDDEN,
            "RESOURCE_EXHAUSTED: QUOTA for this project".to_string(),
        );
        assert!(matches!(err, ClientError::QuotaExceeded(_)));

        let err = classify_failure(StatusCode::BAD_GATEWAY, "upstream hiccup".to_string());
        assert!(matches!(err, ClientError::Server(_)));
    }
}
