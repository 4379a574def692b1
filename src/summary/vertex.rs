use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::{GenerationRequest, SummaryError, TextGenerator};
use crate::config::Settings;

/// Minimal request/response structs for the Vertex AI generateContent API.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini on Vertex AI, called over REST with an OAuth access token.
pub struct VertexClient {
    client: reqwest::Client,
    url: String,
    model_id: String,
    access_token: String,
}

impl VertexClient {
    pub fn new(settings: &Settings, access_token: String) -> Result<Self, SummaryError> {
        let endpoint = format!("https://{}-aiplatform.googleapis.com", settings.location);
        Self::with_endpoint(&endpoint, settings, access_token)
    }

    pub fn with_endpoint(
        endpoint: &str,
        settings: &Settings,
        access_token: String,
    ) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            settings.project_id,
            settings.location,
            settings.model_id
        );

        Ok(Self {
            client,
            url,
            model_id: settings.model_id.clone(),
            access_token,
        })
    }
}

#[async_trait]
impl TextGenerator for VertexClient {
    #[instrument(skip_all, fields(model = %self.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, SummaryError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: request.parts.iter().map(|p| Part { text: p }).collect(),
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };

        info!("calling Gemini on Vertex AI");
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Api { status, body });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SummaryError::EmptyResponse);
        }
        debug!(bytes = text.len(), "received model response");
        Ok(text)
    }
}

/// Use the configured access token, or ask the gcloud CLI for one.
pub async fn resolve_access_token(settings: &Settings) -> Result<String, SummaryError> {
    if let Some(token) = &settings.access_token {
        return Ok(token.clone());
    }

    debug!("no access token configured, asking gcloud");
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| SummaryError::Auth(format!("could not run gcloud: {}", e)))?;

    if !output.status.success() {
        return Err(SummaryError::Auth(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(SummaryError::Auth("gcloud printed no token".to_string()));
    }
    Ok(token)
}
