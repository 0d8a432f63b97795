use crate::{
    config::AdvisoryConfig,
    error::{AppError, AppResult},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Sentinel stored when advisory generation fails. Persisted records never
/// carry an empty advisory.
pub const FALLBACK_ADVISORY: &str = "No advice available";

/// External boundary producing farmer-facing guidance text.
///
/// Failures here are never fatal to a detection request; the orchestrator
/// substitutes [`FALLBACK_ADVISORY`] and carries on.
#[async_trait::async_trait]
pub trait AdvisoryGenerator: Send + Sync {
    async fn generate_advisory(
        &self,
        label: &str,
        confidence_pct: f64,
        language: &str,
    ) -> AppResult<String>;
}

/// Client for the generative-language advisory service
#[derive(Debug, Clone)]
pub struct AdvisoryClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

/// Response from the generation endpoint. Every level is optional; the
/// service omits fields freely on safety blocks and errors.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl AdvisoryClient {
    /// Create a new advisory client. A missing credential is accepted here;
    /// it surfaces as a per-request generation failure instead.
    pub fn new(config: &AdvisoryConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_prompt(label: &str, confidence_pct: f64, language: &str) -> String {
        format!(
            "The ML model detected: {} (confidence: {:.0}%).\n\
             Provide clear pest management advice for small farmers.\n\
             Explain in {}, keep it simple, and include organic & chemical options.",
            label, confidence_pct, language
        )
    }

    /// Pull the advisory text out of a generation response
    fn extract_text(response: GenerateContentResponse) -> Option<String> {
        response
            .candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl AdvisoryGenerator for AdvisoryClient {
    async fn generate_advisory(
        &self,
        label: &str,
        confidence_pct: f64,
        language: &str,
    ) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::advisory("advisory credential not configured"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            api_key
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: Self::build_prompt(label, confidence_pct, language),
                }],
            }],
        };

        debug!("requesting advisory for {} in {}", label, language);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::advisory(format!("advisory request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::advisory(format!(
                "advisory service returned status {}",
                status
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::advisory(format!("malformed advisory response: {}", e)))?;

        Self::extract_text(parsed)
            .ok_or_else(|| AppError::advisory("advisory response carries no text"))
    }
}
