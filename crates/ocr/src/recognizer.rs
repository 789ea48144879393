use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::ProviderConfig;
use crate::preprocess::PreprocessError;
use crate::remote::{HttpStructuredRecognizer, HttpTextRecognizer};
use crate::tesseract::TesseractRecognizer;
use crate::types::RawRecognizedItem;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR provider is not configured: {0}")]
    NotConfigured(String),
    #[error("Image data is empty")]
    EmptyImage,
    #[error("Request to OCR provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to decode OCR provider response: {0}")]
    Decode(String),
    #[error("OCR provider failed: {0}")]
    Provider(String),
    #[error("OCR provider returned no raw items")]
    NoRawItems,
    #[error("OCR provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("OCR executable not found: {0}")]
    ExecutableNotFound(String),
    #[error("OCR process exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
}

/// What an OCR provider hands back: free text for the bill-list parser, or
/// items the provider has already structured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutput {
    Text(String),
    Items(Vec<RawRecognizedItem>),
}

/// Abstraction over an OCR provider.
/// Implementations accept raw image bytes as uploaded.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image_bytes: &[u8],
    ) -> impl Future<Output = Result<OcrOutput, OcrError>> + Send;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a preset output regardless of the image.
pub struct MockRecognizer {
    pub output: OcrOutput,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { output: OcrOutput::Text(text.into()) }
    }

    pub fn with_items(items: Vec<RawRecognizedItem>) -> Self {
        Self { output: OcrOutput::Items(items) }
    }
}

impl OcrBackend for MockRecognizer {
    async fn recognize(&self, _image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        Ok(self.output.clone())
    }
}

// ── Provider chosen by configuration ──────────────────────────────────────────

pub enum Recognizer {
    HttpText(HttpTextRecognizer),
    HttpStructured(HttpStructuredRecognizer),
    Tesseract(TesseractRecognizer),
    Mock(MockRecognizer),
}

impl Recognizer {
    /// `timeout` bounds HTTP requests; the pipeline enforces it for every provider.
    pub fn from_config(provider: &ProviderConfig, timeout: Duration) -> Result<Self, OcrError> {
        Ok(match provider {
            ProviderConfig::HttpText { endpoint } => {
                Recognizer::HttpText(HttpTextRecognizer::new(endpoint, timeout)?)
            }
            ProviderConfig::HttpStructured { endpoint } => {
                Recognizer::HttpStructured(HttpStructuredRecognizer::new(endpoint, timeout)?)
            }
            ProviderConfig::Tesseract { executable, language, preprocess } => Recognizer::Tesseract(
                TesseractRecognizer::new(executable, language).with_preprocess(*preprocess),
            ),
            ProviderConfig::Mock { text } => Recognizer::Mock(MockRecognizer::new(text.clone())),
        })
    }
}

impl OcrBackend for Recognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        match self {
            Recognizer::HttpText(r) => r.recognize(image_bytes).await,
            Recognizer::HttpStructured(r) => r.recognize(image_bytes).await,
            Recognizer::Tesseract(r) => r.recognize(image_bytes).await,
            Recognizer::Mock(r) => r.recognize(image_bytes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_preset_text() {
        let r = MockRecognizer::new("京东超市 2月7日 21:49 -100.00");
        assert_eq!(
            r.recognize(b"fake image data").await.unwrap(),
            OcrOutput::Text("京东超市 2月7日 21:49 -100.00".to_string())
        );
    }

    #[tokio::test]
    async fn mock_ignores_image_content() {
        let r = MockRecognizer::with_items(vec![RawRecognizedItem::default()]);
        assert_eq!(r.recognize(b"").await.unwrap(), OcrOutput::Items(vec![RawRecognizedItem::default()]));
    }

    #[tokio::test]
    async fn from_config_builds_mock() {
        let provider = ProviderConfig::Mock { text: "hello".to_string() };
        let r = Recognizer::from_config(&provider, Duration::from_secs(1)).unwrap();
        assert!(matches!(r, Recognizer::Mock(_)));
        assert_eq!(r.recognize(b"x").await.unwrap(), OcrOutput::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn http_provider_without_endpoint_reports_not_configured() {
        let provider = ProviderConfig::HttpText { endpoint: String::new() };
        let r = Recognizer::from_config(&provider, Duration::from_secs(1)).unwrap();
        assert!(matches!(r.recognize(b"x").await, Err(OcrError::NotConfigured(_))));
    }
}
