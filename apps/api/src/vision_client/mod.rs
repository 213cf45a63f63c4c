//! Vision Client — the single point of entry for calls to the image-understanding service.
//!
//! Protocol: upload the image, create a prediction that references it, then poll
//! the prediction until it reaches a terminal status. When no token is
//! configured the base URL is assumed to be an authenticating relay and requests
//! go out without an `Authorization` header.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub mod prompts;

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);
const POLL_BACKOFF: f64 = 1.5;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Prediction {id} failed: {message}")]
    PredictionFailed { id: String, message: String },

    #[error("Prediction {id} did not finish within {timeout:?}")]
    Timeout { id: String, timeout: Duration },

    #[error("Prediction returned empty output")]
    EmptyOutput,
}

#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub model: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    model: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    urls: UploadUrls,
}

#[derive(Debug, Deserialize)]
struct UploadUrls {
    get: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

/// Models answer either with one string or with a list of streamed chunks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Text(String),
    Chunks(Vec<String>),
}

impl PredictionOutput {
    fn into_text(self) -> String {
        match self {
            PredictionOutput::Text(text) => text,
            PredictionOutput::Chunks(chunks) => chunks.concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    settings: VisionSettings,
}

impl VisionClient {
    pub fn new(settings: VisionSettings) -> Result<Self, VisionError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.api_token {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }

    /// Uploads raw image bytes and returns the URL the service serves them from.
    pub async fn upload_image(&self, image: Bytes) -> Result<String, VisionError> {
        let part = multipart::Part::bytes(image.to_vec()).file_name("image");
        let form = multipart::Form::new().part("content", part);
        let response = self
            .authorize(self.client.post(self.url("files")))
            .multipart(form)
            .send()
            .await?;
        let upload: UploadResponse = read_json(response).await?;
        debug!("Uploaded image to {}", upload.urls.get);
        Ok(upload.urls.get)
    }

    /// Starts a prediction and returns its id.
    pub async fn create_prediction(&self, prompt: &str, image_url: &str) -> Result<String, VisionError> {
        let body = PredictionRequest {
            model: &self.settings.model,
            input: PredictionInput {
                prompt,
                image: image_url,
            },
        };
        let response = self
            .authorize(self.client.post(self.url("predictions")))
            .json(&body)
            .send()
            .await?;
        let prediction: Prediction = read_json(response).await?;
        debug!("Created prediction {} ({:?})", prediction.id, prediction.status);
        Ok(prediction.id)
    }

    /// Polls a prediction until it succeeds, fails or the configured timeout elapses.
    /// The wait between polls grows by 1.5× up to 10s.
    pub async fn poll_prediction(&self, id: &str) -> Result<String, VisionError> {
        let deadline = Instant::now() + self.settings.timeout;
        let mut delay = self.settings.poll_interval;

        loop {
            let response = self
                .authorize(self.client.get(self.url(&format!("predictions/{id}"))))
                .send()
                .await?;
            let prediction: Prediction = read_json(response).await?;

            match prediction.status {
                PredictionStatus::Succeeded => {
                    let text = prediction
                        .output
                        .map(PredictionOutput::into_text)
                        .filter(|text| !text.trim().is_empty())
                        .ok_or(VisionError::EmptyOutput)?;
                    return Ok(text);
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Err(VisionError::PredictionFailed {
                        id: id.to_string(),
                        message: prediction
                            .error
                            .unwrap_or_else(|| "Prediction failed".to_string()),
                    });
                }
                PredictionStatus::Starting | PredictionStatus::Processing => {}
            }

            if Instant::now() + delay > deadline {
                warn!("Prediction {id} still {:?} at deadline", prediction.status);
                return Err(VisionError::Timeout {
                    id: id.to_string(),
                    timeout: self.settings.timeout,
                });
            }
            tokio::time::sleep(delay).await;
            delay = delay.mul_f64(POLL_BACKOFF).min(MAX_POLL_INTERVAL);
        }
    }

    /// Upload → predict → poll, returning the model's raw text answer.
    pub async fn run(&self, prompt: &str, image: Bytes) -> Result<String, VisionError> {
        let image_url = self.upload_image(image).await?;
        let id = self.create_prediction(prompt, &image_url).await?;
        let output = self.poll_prediction(&id).await?;
        info!("Prediction {id} succeeded ({} chars)", output.len());
        Ok(output)
    }

    /// Runs the prediction and deserializes the answer as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn run_json<T: DeserializeOwned>(&self, prompt: &str, image: Bytes) -> Result<T, VisionError> {
        let output = self.run(prompt, image).await?;
        serde_json::from_str(strip_json_fences(&output)).map_err(VisionError::Parse)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, VisionError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(VisionError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}
