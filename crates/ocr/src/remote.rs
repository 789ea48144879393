//! HTTP OCR services.
//!
//! Both variants receive the image as a multipart form field named `image`.
//! The text service answers `{ "success": bool, "text": string, "error"?: string }`;
//! the structured service answers `{ "success": bool, "raw": [...], "error"?: string }`.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::recognizer::{OcrBackend, OcrError, OcrOutput};
use crate::types::RawRecognizedItem;

const IMAGE_FIELD: &str = "image";
const IMAGE_FILE_NAME: &str = "bill.jpg";

/// Shared request plumbing for both service shapes.
struct OcrEndpoint {
    client: reqwest::Client,
    url: String,
}

impl OcrEndpoint {
    fn new(url: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.trim().to_string() })
    }

    async fn post_image(&self, image_bytes: &[u8]) -> Result<Vec<u8>, OcrError> {
        if image_bytes.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        if self.url.is_empty() {
            return Err(OcrError::NotConfigured("endpoint is empty".to_string()));
        }

        let part = Part::bytes(image_bytes.to_vec()).file_name(IMAGE_FILE_NAME);
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::warn!("Request to OCR endpoint {} failed: {e}", self.url))?;

        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!("OCR endpoint answered {status} with {} bytes", body.len());
        Ok(body.to_vec())
    }
}

// ── Text service ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TextResponse {
    success: bool,
    #[serde(default)]
    text: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpTextRecognizer {
    endpoint: OcrEndpoint,
}

impl HttpTextRecognizer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, OcrError> {
        Ok(Self { endpoint: OcrEndpoint::new(url, timeout)? })
    }
}

impl OcrBackend for HttpTextRecognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        let body = self.endpoint.post_image(image_bytes).await?;
        decode_text_response(&body).map(OcrOutput::Text)
    }
}

pub(crate) fn decode_text_response(body: &[u8]) -> Result<String, OcrError> {
    let response: TextResponse =
        serde_json::from_slice(body).map_err(|e| OcrError::Decode(e.to_string()))?;
    if !response.success {
        return Err(provider_failure(response.error));
    }
    Ok(response.text.trim().to_string())
}

// ── Structured service ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StructuredResponse {
    success: bool,
    #[serde(default)]
    raw: Vec<StructuredItem>,
    #[serde(default)]
    error: Option<String>,
}

/// One row as the structured service reports it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructuredItem {
    amount: String,
    /// Transaction type token.
    classify: String,
    account: String,
    date: String,
    /// Category name.
    project: String,
    /// Tag names, comma separated.
    label: String,
    text: String,
}

impl From<StructuredItem> for RawRecognizedItem {
    fn from(item: StructuredItem) -> Self {
        RawRecognizedItem {
            transaction_type: item.classify.trim().to_string(),
            time: item.date.trim().to_string(),
            amount: item.amount.trim().to_string(),
            account_name: item.account.trim().to_string(),
            category_name: item.project.trim().to_string(),
            tag_names: split_labels(&item.label),
            description: item.text.trim().to_string(),
            ..Default::default()
        }
    }
}

fn split_labels(label: &str) -> Vec<String> {
    label
        .split([',', '，', ';', '；'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct HttpStructuredRecognizer {
    endpoint: OcrEndpoint,
}

impl HttpStructuredRecognizer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, OcrError> {
        Ok(Self { endpoint: OcrEndpoint::new(url, timeout)? })
    }
}

impl OcrBackend for HttpStructuredRecognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        let body = self.endpoint.post_image(image_bytes).await?;
        decode_structured_response(&body).map(OcrOutput::Items)
    }
}

pub(crate) fn decode_structured_response(body: &[u8]) -> Result<Vec<RawRecognizedItem>, OcrError> {
    let response: StructuredResponse =
        serde_json::from_slice(body).map_err(|e| OcrError::Decode(e.to_string()))?;
    if !response.success {
        return Err(provider_failure(response.error));
    }
    if response.raw.is_empty() {
        return Err(OcrError::NoRawItems);
    }
    Ok(response.raw.into_iter().map(RawRecognizedItem::from).collect())
}

fn provider_failure(error: Option<String>) -> OcrError {
    match error.filter(|e| !e.trim().is_empty()) {
        Some(message) => OcrError::Provider(message),
        None => OcrError::Provider("failed without error message".to_string()),
    }
}
