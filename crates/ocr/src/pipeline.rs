use billsnap_core::{BookkeepingData, DataError, FeatureRestrictions, UserId};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use thiserror::Error;

use crate::assemble::Assembler;
use crate::bill_list::BillListParser;
use crate::config::RecognitionConfig;
use crate::recognizer::{OcrBackend, OcrError, OcrOutput};
use crate::resolve::LookupTables;
use crate::types::{RawRecognizedItem, RecognitionResponse};
use crate::upload::{ImageUpload, UploadError};

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Receipt image recognition is not enabled")]
    ConfigDisabled,
    #[error("User {0} not found")]
    UserNotFound(UserId),
    #[error("User is not permitted to create transactions from image recognition")]
    PermissionDenied,
    #[error(transparent)]
    InputValidation(#[from] UploadError),
    #[error(transparent)]
    ProviderFailure(#[from] OcrError),
    #[error("No transaction information was detected in the image")]
    EmptyRecognition,
    /// The detail is logged, not shown to the caller.
    #[error("Operation failed")]
    Internal(String),
}

impl RecognitionError {
    /// Stable outcome name for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            RecognitionError::ConfigDisabled => "config_disabled",
            RecognitionError::UserNotFound(_) => "user_not_found",
            RecognitionError::PermissionDenied => "permission_denied",
            RecognitionError::InputValidation(_) => "input_validation",
            RecognitionError::ProviderFailure(_) => "provider_failure",
            RecognitionError::EmptyRecognition => "empty_recognition",
            RecognitionError::Internal(_) => "internal",
        }
    }
}

/// One upload from one user.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub uid: UserId,
    pub image: Option<ImageUpload>,
    /// Source of the year for bill lines, which carry none. Its offset is the
    /// client timezone recognized times are read in.
    reference_time: DateTime<FixedOffset>,
}

impl RecognitionRequest {
    pub fn new(uid: UserId, timezone: FixedOffset, image: Option<ImageUpload>) -> Self {
        Self {
            uid,
            image,
            reference_time: Utc::now().with_timezone(&timezone),
        }
    }

    /// Pin the reference instant. It is converted into the request's
    /// timezone, so the inferred year is the client's local year.
    pub fn with_reference_time<Tz: TimeZone>(mut self, reference_time: DateTime<Tz>) -> Self {
        self.reference_time = reference_time.with_timezone(&self.timezone());
        self
    }

    pub fn timezone(&self) -> FixedOffset {
        *self.reference_time.offset()
    }

    pub fn reference_time(&self) -> &DateTime<FixedOffset> {
        &self.reference_time
    }
}

/// Orchestrates: checks → upload validation → OCR → parse → lookups → assemble.
pub struct RecognitionPipeline<R: OcrBackend, D: BookkeepingData> {
    config: RecognitionConfig,
    recognizer: R,
    data: D,
}

impl<R: OcrBackend, D: BookkeepingData> RecognitionPipeline<R, D> {
    pub fn new(config: RecognitionConfig, recognizer: R, data: D) -> Self {
        Self { config, recognizer, data }
    }

    /// Turn one screenshot into reviewable candidates.
    ///
    /// Any failure before assembly aborts the batch. Items rejected during
    /// assembly are logged and dropped; the batch fails only when none remain.
    pub async fn recognize(
        &self,
        request: &RecognitionRequest,
    ) -> Result<RecognitionResponse, RecognitionError> {
        let uid = request.uid;

        // 1. Feature toggle and per-user restriction.
        if !self.config.enabled {
            return Err(RecognitionError::ConfigDisabled);
        }
        let user = self.data.get_user(uid).await.map_err(|e| match e {
            DataError::UserNotFound(uid) => {
                tracing::warn!("Recognition requested for unknown user {uid}");
                RecognitionError::UserNotFound(uid)
            }
            e => internal(uid, "failed to load user", e),
        })?;
        if user
            .feature_restrictions
            .contains(FeatureRestrictions::CREATE_TRANSACTION_FROM_IMAGE_RECOGNITION)
        {
            return Err(RecognitionError::PermissionDenied);
        }

        // 2. Upload.
        let image = request.image.as_ref().ok_or(UploadError::Missing)?;
        let content_type = image.validate(self.config.max_image_size)?;
        tracing::debug!("{uid} uploaded {} bytes of {content_type}", image.data.len());

        // 3. OCR, bounded by the configured timeout.
        let output = self.run_provider(uid, &image.data).await?;

        // 4. Raw items.
        let raw_items: Vec<RawRecognizedItem> = match output {
            OcrOutput::Text(text) => BillListParser::parse(&text, request.reference_time()),
            OcrOutput::Items(items) => items,
        };
        if raw_items.is_empty() {
            tracing::warn!("{uid}: recognized image contains no transaction lines");
            return Err(RecognitionError::EmptyRecognition);
        }

        // 5. One lookup snapshot for the whole batch.
        let (accounts, categories, tags) = tokio::try_join!(
            self.data.get_all_accounts(uid),
            self.data.get_all_categories(uid),
            self.data.get_all_tags(uid),
        )
        .map_err(|e| internal(uid, "failed to load lookup data", e))?;
        let lookups = LookupTables::build(&accounts, &categories, &tags);

        // 6. Assemble.
        let transactions = Assembler::new(&lookups, request.timezone()).assemble_all(&raw_items);
        if transactions.is_empty() {
            tracing::warn!("{uid}: all {} recognized items were rejected", raw_items.len());
            return Err(RecognitionError::EmptyRecognition);
        }

        tracing::info!(
            "{uid}: recognized {} of {} items from image",
            transactions.len(),
            raw_items.len()
        );
        Ok(RecognitionResponse { transactions })
    }

    async fn run_provider(&self, uid: UserId, image: &[u8]) -> Result<OcrOutput, RecognitionError> {
        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, self.recognizer.recognize(image)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout(timeout)),
        };
        result.map_err(|e| match e {
            OcrError::NotConfigured(_) => internal(uid, "OCR provider unavailable", e),
            e => {
                tracing::warn!("{uid}: OCR provider failed: {e}");
                RecognitionError::ProviderFailure(e)
            }
        })
    }
}

fn internal(uid: UserId, what: &str, err: impl std::fmt::Display) -> RecognitionError {
    tracing::error!("{uid}: {what}: {err}");
    RecognitionError::Internal(format!("{what}: {err}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
