use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MatchError;
use crate::models::ProfileAnalysis;

/// Errors that can occur when talking to the AI service
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Network failures, rate limiting and server errors are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::RequestError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AiError::ApiError { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            AiError::InvalidResponse(_) => false,
        }
    }
}

impl From<AiError> for MatchError {
    fn from(e: AiError) -> Self {
        MatchError::ExternalService(e.to_string())
    }
}

/// Writes human-readable compatibility prose for a ranked pair
#[async_trait::async_trait]
pub trait ExplanationGenerator: Send + Sync {
    async fn generate_explanation(
        &self,
        requester: &ProfileAnalysis,
        candidate: &ProfileAnalysis,
        score: u8,
    ) -> Result<String, AiError>;
}

/// Turns a biography into structured signals and a semantic vector
#[async_trait::async_trait]
pub trait ProfileAnalyzer: Send + Sync {
    async fn analyze_profile(&self, bio: &str) -> Result<ProfileAnalysis, AiError>;

    /// Raw numbers; callers fit them to the configured dimension
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError>;
}

/// Placeholder prose used when explanation generation is unavailable
pub fn fallback_explanation(template: &str, score: u8) -> String {
    template.replace("{score}", &score.to_string())
}

/// Client settings for the Messages API
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub analysis_model: String,
    pub embedding_model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client
///
/// Handles all communication with the AI backend:
/// - Profile analysis
/// - Embedding generation
/// - Compatibility explanations
pub struct AnthropicClient {
    config: AiClientConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: AiClientConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::error!("Failed to build HTTP client with timeouts, using default: {}", e);
                Client::default()
            });

        Self { config, client }
    }

    /// Send one user prompt, retrying transient failures with linear backoff
    async fn complete(&self, model: &str, max_tokens: u32, prompt: &str) -> Result<String, AiError> {
        let mut attempt = 0;
        loop {
            match self.complete_once(model, max_tokens, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "AI request failed (attempt {}/{}), retrying: {}",
                        attempt,
                        self.config.max_retries,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn complete_once(&self, model: &str, max_tokens: u32, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        let request = MessagesRequest {
            model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError { status, body });
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| AiError::InvalidResponse("no text block in response".into()))
    }
}

#[async_trait::async_trait]
impl ProfileAnalyzer for AnthropicClient {
    async fn analyze_profile(&self, bio: &str) -> Result<ProfileAnalysis, AiError> {
        let prompt = analysis_prompt(bio);
        let text = self.complete(&self.config.analysis_model, 2048, &prompt).await?;
        parse_analysis(&text)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let prompt = embedding_prompt(text);
        let reply = self.complete(&self.config.embedding_model, 4096, &prompt).await?;
        parse_embedding_reply(&reply)
    }
}

#[async_trait::async_trait]
impl ExplanationGenerator for AnthropicClient {
    async fn generate_explanation(
        &self,
        requester: &ProfileAnalysis,
        candidate: &ProfileAnalysis,
        score: u8,
    ) -> Result<String, AiError> {
        let prompt = explanation_prompt(requester, candidate, score)?;
        self.complete(&self.config.analysis_model, 1024, &prompt).await
    }
}

fn analysis_prompt(bio: &str) -> String {
    format!(
        r#"Read this dating profile biography and extract its compatibility signals, including the implicit ones.

Biography:
"""
{bio}
"""

Reply with a single JSON object of this shape:
{{
  "values": ["core values stated or implied"],
  "personalityTraits": ["key personality traits"],
  "communicationStyle": "how this person communicates",
  "relationshipGoals": ["what they want from a relationship"],
  "interests": ["hobbies, passions, lifestyle"],
  "dealbreakers": ["things they would not be compatible with"],
  "emotionalTone": "overall emotional tone of the writing",
  "authenticity": 0,
  "insights": ["deeper observations about their compatibility needs"]
}}

"authenticity" is a number from 0 to 10 rating how genuine and thoughtful the biography is."#
    )
}

fn embedding_prompt(text: &str) -> String {
    format!(
        "Represent the following profile analysis as a semantic embedding: a list of numbers \
         between -1 and 1, separated by commas. Output the numbers only.\n\nContent: {text}"
    )
}

fn explanation_prompt(
    requester: &ProfileAnalysis,
    candidate: &ProfileAnalysis,
    score: u8,
) -> Result<String, AiError> {
    let first = serde_json::to_string_pretty(requester)
        .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
    let second = serde_json::to_string_pretty(candidate)
        .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

    Ok(format!(
        r#"Two people were matched on a dating app. Explain their compatibility warmly and honestly.

Person 1 analysis:
{first}

Person 2 analysis:
{second}

Compatibility score: {score}/100

Write three to four paragraphs in the second person ("You both...") that highlight the most interesting shared signals, explain why they matter for a relationship, and point out differences that could complement each other."#
    ))
}

/// Extract the JSON object between the first `{` and the last `}`
pub fn parse_analysis(text: &str) -> Result<ProfileAnalysis, AiError> {
    let start = text.find('{');
    let end = text.rfind('}');

    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => return Err(AiError::InvalidResponse("no JSON object in analysis reply".into())),
    };

    serde_json::from_str(json)
        .map_err(|e| AiError::InvalidResponse(format!("Failed to parse analysis: {}", e)))
}

/// Parse a comma-separated list of numbers
///
/// An unparsable or non-finite token becomes 0.0 in its own position so the
/// values after it keep their dimension.
pub fn parse_embedding_reply(text: &str) -> Result<Vec<f32>, AiError> {
    let parsed: Vec<Option<f32>> = text
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|token| token.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect();

    if parsed.iter().all(Option::is_none) {
        return Err(AiError::InvalidResponse("no numbers in embedding reply".into()));
    }
    Ok(parsed.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> AiClientConfig {
        AiClientConfig {
            base_url,
            api_key: "test_key".to_string(),
            analysis_model: "analysis-model".to_string(),
            embedding_model: "embedding-model".to_string(),
            timeout_secs: 5,
            max_retries: 0,
        }
    }

    fn text_reply(text: &str) -> String {
        serde_json::json!({
            "content": [{ "type": "text", "text": text }]
        })
        .to_string()
    }

    const ANALYSIS_JSON: &str = r#"{"values":["honesty"],"personalityTraits":["curious"],"communicationStyle":"direct","relationshipGoals":["long-term"],"interests":["hiking"],"emotionalTone":"warm","authenticity":7}"#;

    #[test]
    fn test_parse_analysis_with_surrounding_prose() {
        let text = format!("Here is the analysis:\n{}\nHope this helps!", ANALYSIS_JSON);
        let analysis = parse_analysis(&text).unwrap();
        assert_eq!(analysis.values, vec!["honesty"]);
        assert_eq!(analysis.authenticity, 7.0);
    }

    #[test]
    fn test_parse_analysis_without_json() {
        assert!(parse_analysis("I cannot do that").is_err());
    }

    #[test]
    fn test_parse_embedding_reply() {
        let values = parse_embedding_reply("0.1, -0.5 ,0.25").unwrap();
        assert_eq!(values, vec![0.1, -0.5, 0.25]);
        assert!(parse_embedding_reply("nothing here").is_err());
    }

    #[test]
    fn test_parse_embedding_reply_keeps_positions() {
        let values = parse_embedding_reply("[0.1, oops, 0.25, NaN, -1]").unwrap();
        assert_eq!(values, vec![0.1, 0.0, 0.25, 0.0, -1.0]);
    }

    #[test]
    fn test_fallback_explanation() {
        let text = fallback_explanation("Compatibility score: {score}/100", 72);
        assert_eq!(text, "Compatibility score: 72/100");
    }

    #[tokio::test]
    async fn test_analyze_profile_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test_key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(text_reply(ANALYSIS_JSON))
            .create_async()
            .await;

        let client = AnthropicClient::new(config(server.url()));
        let analysis = client.analyze_profile("A long enough biography").await.unwrap();

        assert_eq!(analysis.interests, vec!["hiking"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_explanation_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(text_reply("  You both value honesty.  "))
            .create_async()
            .await;

        let client = AnthropicClient::new(config(server.url()));
        let text = client
            .generate_explanation(&ProfileAnalysis::default(), &ProfileAnalysis::default(), 80)
            .await
            .unwrap();

        assert_eq!(text, "You both value honesty.");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = AnthropicClient::new(config(server.url()));
        let err = client.generate_embedding("text").await.unwrap_err();

        assert!(err.is_transient());
        assert!(matches!(err, AiError::ApiError { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/v1/messages")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let mut cfg = config(server.url());
        cfg.max_retries = 2;
        let client = AnthropicClient::new(cfg);

        assert!(client.generate_embedding("text").await.is_err());
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let unauthorized = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let mut cfg = config(server.url());
        cfg.max_retries = 3;
        let client = AnthropicClient::new(cfg);

        let err = client.analyze_profile("bio").await.unwrap_err();
        assert!(!err.is_transient());
        unauthorized.assert_async().await;
    }
}
