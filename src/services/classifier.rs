use crate::{
    config::ClassifierConfig,
    error::{AppError, AppResult},
};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Classification produced by the external model service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Detected pest label
    pub label: String,
    /// Raw confidence as reported by the service; scale is service-defined
    /// ([0,1] or [0,100])
    pub confidence: f64,
}

/// External boundary mapping image bytes to a pest label.
///
/// Injected into the detection service so tests can substitute a double
/// without touching process-wide state.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        image: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> AppResult<Classification>;
}

/// HTTP client for the model-serving endpoint
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http: Client,
    base_url: String,
}

/// Prediction response from the model service.
///
/// Older deployments report the label under `pest`, current ones under
/// `label`; both are accepted.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(alias = "pest")]
    label: Option<String>,
    confidence: Option<f64>,
}

impl ClassifierClient {
    /// Create a new classifier client with a bounded request timeout
    pub fn new(config: &ClassifierConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

#[async_trait::async_trait]
impl Classifier for ClassifierClient {
    async fn classify(
        &self,
        image: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> AppResult<Classification> {
        let url = self.url("/predict");
        debug!("submitting image to classifier: {}", url);

        let part = Part::bytes(image.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| AppError::classification(format!("failed to build image part: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::classification(format!("classifier timed out: {}", e))
                } else {
                    AppError::classification(format!("classifier request failed: {}", e))
                }
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::classification(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::classification(format!(
                "classifier returned status {}: {}",
                status, response_text
            )));
        }

        let predict: PredictResponse = serde_json::from_str(&response_text)
            .map_err(|e| AppError::classification(format!("malformed response: {}", e)))?;

        let label = predict
            .label
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| AppError::classification("response carries no pest label"))?;
        let confidence = predict
            .confidence
            .ok_or_else(|| AppError::classification("response carries no confidence"))?;

        info!("classifier result: {} ({})", label, confidence);

        Ok(Classification { label, confidence })
    }
}
