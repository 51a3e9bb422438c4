//! watsonx.ai text-generation client
//!
//! An API key is exchanged for a bearer token once at start-up. Each run
//! works on its own [`WatsonxSession`] holding a copy of that token; when the
//! endpoint rejects the token the session re-authenticates once and repeats
//! the call once. Every other failure is returned to the caller unretried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{Prompt, TextGenerator};
use crate::config::GenerationConfig;
use crate::{Result, WaterSeekerError};

const API_KEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Bearer token and its expiry, when the IAM service reported one
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Expired tokens are refreshed before use
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    min_new_tokens: u32,
    repetition_penalty: f32,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    input: &'a str,
    parameters: GenerationParameters,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

enum Attempt {
    Generated(String),
    Unauthorized,
}

/// Stateless HTTP side of the generation endpoint
pub struct WatsonxClient {
    http: Client,
    config: GenerationConfig,
    api_key: String,
}

impl WatsonxClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            WaterSeekerError::config("Generation API key is required to call the text-generation endpoint")
        })?;

        let http = Client::builder()
            .user_agent(concat!("WaterSeeker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WaterSeekerError::general(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: config.clone(),
            api_key,
        })
    }

    /// Exchange the API key for a bearer token
    #[instrument(skip(self))]
    pub async fn request_token(&self) -> Result<AccessToken> {
        let timeout = u64::from(self.config.auth_timeout_seconds);
        let response = self
            .http
            .post(&self.config.iam_url)
            .timeout(Duration::from_secs(timeout))
            .header(header::ACCEPT, "application/json")
            .form(&[("grant_type", API_KEY_GRANT), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WaterSeekerError::authentication(format!(
                "Failed to get IAM token: {} - {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            WaterSeekerError::authentication(format!("Invalid IAM token response: {e}"))
        })?;

        let expires_at = token
            .expires_in
            .map(|seconds| Utc::now() + chrono::Duration::seconds(seconds));
        info!("Acquired IAM token (expires at {:?})", expires_at);

        Ok(AccessToken::new(token.access_token, expires_at))
    }

    /// Authenticate and open a session for one run
    pub async fn start_session(&self) -> Result<WatsonxSession<'_>> {
        let token = self.request_token().await?;
        Ok(self.session(token))
    }

    /// Open a session with an already acquired token
    #[must_use]
    pub fn session(&self, token: AccessToken) -> WatsonxSession<'_> {
        WatsonxSession {
            client: self,
            token,
        }
    }

    fn request_body<'a>(&'a self, input: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            input,
            parameters: GenerationParameters {
                decoding_method: "greedy",
                max_new_tokens: self.config.max_new_tokens,
                min_new_tokens: self.config.min_new_tokens,
                repetition_penalty: self.config.repetition_penalty,
            },
            model_id: &self.config.model_id,
            project_id: &self.config.project_id,
        }
    }

    async fn attempt(&self, token: &AccessToken, input: &str) -> Result<Attempt> {
        let timeout = u64::from(self.config.timeout_seconds);
        let start = Instant::now();

        let response = self
            .http
            .post(&self.config.base_url)
            .timeout(Duration::from_secs(timeout))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&token.value)
            .json(&self.request_body(input))
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        debug!(
            "Generation response {} in {:.3}s",
            status,
            start.elapsed().as_secs_f64()
        );

        if status == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WaterSeekerError::api(format!(
                "API call failed: {} - {body}",
                status.as_u16()
            )));
        }

        let body: GenerationResponse = response.json().await.map_err(|e| {
            WaterSeekerError::api(format!("Invalid generation response: {e}"))
        })?;

        body.results
            .into_iter()
            .next()
            .map(|r| Attempt::Generated(r.generated_text))
            .ok_or_else(|| WaterSeekerError::api("Generation response contained no results"))
    }
}

fn transport_error(error: reqwest::Error, timeout_seconds: u64) -> WaterSeekerError {
    if error.is_timeout() {
        WaterSeekerError::Timeout {
            seconds: timeout_seconds,
        }
    } else {
        WaterSeekerError::api(format!("Request failed: {error}"))
    }
}

/// Per-run generation context owning its copy of the token
pub struct WatsonxSession<'a> {
    client: &'a WatsonxClient,
    token: AccessToken,
}

impl WatsonxSession<'_> {
    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    async fn refresh(&mut self) -> Result<()> {
        self.token = self.client.request_token().await?;
        Ok(())
    }
}

#[async_trait]
impl TextGenerator for WatsonxSession<'_> {
    #[instrument(skip_all, fields(template = prompt.template_id()))]
    async fn generate(&mut self, prompt: &Prompt) -> Result<String> {
        let input = prompt.render();
        let mut refreshed = false;

        if self.token.is_expired() {
            info!("Bearer token expired, re-authenticating");
            self.refresh().await?;
            refreshed = true;
        }

        match self.client.attempt(&self.token, &input).await? {
            Attempt::Generated(text) => Ok(text),
            Attempt::Unauthorized if !refreshed => {
                warn!("Generation endpoint rejected the bearer token, re-authenticating once");
                self.refresh().await?;
                match self.client.attempt(&self.token, &input).await? {
                    Attempt::Generated(text) => Ok(text),
                    Attempt::Unauthorized => Err(WaterSeekerError::authentication(
                        "Generation endpoint rejected a freshly issued token",
                    )),
                }
            }
            Attempt::Unauthorized => Err(WaterSeekerError::authentication(
                "Generation endpoint rejected a freshly issued token",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaterSeekerConfig;
    use crate::test_support::serve;
    use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config_with_key() -> GenerationConfig {
        let mut config = WaterSeekerConfig::default().generation;
        config.api_key = Some("test-api-key-123".to_string());
        config
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = WaterSeekerConfig::default().generation;
        let result = WatsonxClient::new(&config);
        assert!(matches!(result, Err(WaterSeekerError::Config { .. })));
    }

    #[test]
    fn test_request_body_shape() {
        let client = WatsonxClient::new(&config_with_key()).unwrap();
        let body = serde_json::to_value(client.request_body("prompt text")).unwrap();

        assert_eq!(body["input"], "prompt text");
        assert_eq!(body["model_id"], "ibm/granite-3-8b-instruct");
        assert_eq!(body["parameters"]["decoding_method"], "greedy");
        assert_eq!(body["parameters"]["max_new_tokens"], 1000);
        assert_eq!(body["parameters"]["min_new_tokens"], 50);
        assert_eq!(body["parameters"]["repetition_penalty"], 1.0);
        assert!(body["project_id"].is_string());
    }

    #[test]
    fn test_generation_response_parsing() {
        let body: GenerationResponse = serde_json::from_str(
            r#"{"model_id":"ibm/granite-3-8b-instruct","results":[{"generated_text":"- Location 1","stop_reason":"eos_token"}]}"#,
        )
        .unwrap();
        assert_eq!(body.results[0].generated_text, "- Location 1");
    }

    #[test]
    fn test_token_expiry() {
        let fresh = AccessToken::new("a", Some(Utc::now() + chrono::Duration::minutes(5)));
        let stale = AccessToken::new("b", Some(Utc::now() - chrono::Duration::seconds(1)));
        let open = AccessToken::new("c", None);

        assert!(!fresh.is_expired());
        assert!(stale.is_expired());
        assert!(!open.is_expired());
    }

    #[test]
    fn test_session_keeps_its_own_token() {
        let client = WatsonxClient::new(&config_with_key()).unwrap();
        let token = AccessToken::new("shared", None);
        let session = client.session(token.clone());
        assert_eq!(session.token().value, "shared");
    }

    struct Upstream {
        issued_prefix: &'static str,
        generation_status: StatusCode,
        tokens_issued: AtomicUsize,
        generations: AtomicUsize,
    }

    impl Upstream {
        fn new(issued_prefix: &'static str, generation_status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                issued_prefix,
                generation_status,
                tokens_issued: AtomicUsize::new(0),
                generations: AtomicUsize::new(0),
            })
        }
    }

    async fn issue_token(State(upstream): State<Arc<Upstream>>) -> Json<Value> {
        let n = upstream.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({
            "access_token": format!("{}-{n}", upstream.issued_prefix),
            "expires_in": 3600
        }))
    }

    async fn generate_text(
        State(upstream): State<Arc<Upstream>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        upstream.generations.fetch_add(1, Ordering::SeqCst);
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer token-"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "expired"})));
        }
        if upstream.generation_status != StatusCode::OK {
            return (upstream.generation_status, Json(json!({"error": "boom"})));
        }
        (
            StatusCode::OK,
            Json(json!({"results": [{"generated_text": "- Location 1"}]})),
        )
    }

    async fn client_for(upstream: &Arc<Upstream>) -> WatsonxClient {
        let router = Router::new()
            .route("/identity/token", post(issue_token))
            .route("/ml/v1/text/generation", post(generate_text))
            .with_state(upstream.clone());
        let base_url = serve(router).await;

        let mut config = config_with_key();
        config.iam_url = format!("{base_url}/identity/token");
        config.base_url = format!("{base_url}/ml/v1/text/generation?version=2023-05-29");
        WatsonxClient::new(&config).unwrap()
    }

    fn prompt() -> Prompt {
        Prompt::recommendation("- Location 1 (lat: 1.0, lon: 2.0)", 1)
    }

    #[tokio::test]
    async fn test_request_token_reads_expiry() {
        let upstream = Upstream::new("token", StatusCode::OK);
        let client = client_for(&upstream).await;

        let token = client.request_token().await.unwrap();

        assert_eq!(token.value, "token-1");
        assert!(token.expires_at().is_some());
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_rejected_token_refreshed_and_retried_once() {
        let upstream = Upstream::new("token", StatusCode::OK);
        let client = client_for(&upstream).await;
        let mut session = client.session(AccessToken::new("stale", None));

        let text = session.generate(&prompt()).await.unwrap();

        assert_eq!(text, "- Location 1");
        assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.generations.load(Ordering::SeqCst), 2);
        assert_eq!(session.token().value, "token-1");
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_before_use() {
        let upstream = Upstream::new("token", StatusCode::OK);
        let client = client_for(&upstream).await;
        let expired = AccessToken::new("stale", Some(Utc::now() - chrono::Duration::minutes(1)));
        let mut session = client.session(expired);

        session.generate(&prompt()).await.unwrap();

        assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.generations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_rejection_is_an_authentication_error() {
        let upstream = Upstream::new("revoked", StatusCode::OK);
        let client = client_for(&upstream).await;
        let mut session = client.session(AccessToken::new("stale", None));

        let result = session.generate(&prompt()).await;

        assert!(matches!(result, Err(WaterSeekerError::Authentication { .. })));
        assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.generations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let upstream = Upstream::new("token", StatusCode::INTERNAL_SERVER_ERROR);
        let client = client_for(&upstream).await;
        let mut session = client.session(AccessToken::new("token-0", None));

        let result = session.generate(&prompt()).await;

        match result {
            Err(WaterSeekerError::Api { message }) => {
                assert!(message.starts_with("API call failed: 500"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert_eq!(upstream.generations.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 0);
    }
}
