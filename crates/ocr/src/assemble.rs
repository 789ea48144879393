//! Per-item validation: raw recognized text in, reviewed-ready candidate out.
//!
//! Each stage yields a [`Stage`]. `Omitted` leaves the field unset and the
//! item carries on; `Rejected` drops the item from the batch.

use std::str::FromStr;

use billsnap_core::datetime::{normalize_date_text, parse_long_date_time};
use billsnap_core::{AmountError, CategoryId, Money, TransactionType};
use chrono::FixedOffset;
use thiserror::Error;

use crate::resolve::LookupTables;
use crate::types::{RawRecognizedItem, RecognitionCandidate};

/// Outcome of one assembly stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage<T> {
    Value(T),
    /// Soft failure or nothing to do; the field stays unset.
    Omitted,
    /// Hard failure; the item is excluded from the batch.
    Rejected(Rejection),
}

impl<T> Stage<T> {
    pub fn into_result(self) -> Result<Option<T>, Rejection> {
        match self {
            Stage::Value(v) => Ok(Some(v)),
            Stage::Omitted => Ok(None),
            Stage::Rejected(r) => Err(r),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Why an item produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("recognized transaction type is empty")]
    EmptyType,
    #[error("recognized transaction type \"{0}\" is invalid")]
    InvalidType(String),
    #[error("recognized amount is empty")]
    MissingAmount,
    #[error("recognized amount \"{0}\" is invalid")]
    InvalidAmount(String),
    #[error("recognized destination amount \"{0}\" is invalid")]
    InvalidDestinationAmount(String),
}

impl Rejection {
    /// An empty type just means the line held no transaction; everything else
    /// is a provider producing something it should not.
    pub fn severity(&self) -> Severity {
        match self {
            Rejection::EmptyType => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub struct Assembler<'a> {
    lookups: &'a LookupTables,
    timezone: FixedOffset,
}

impl<'a> Assembler<'a> {
    pub fn new(lookups: &'a LookupTables, timezone: FixedOffset) -> Self {
        Self { lookups, timezone }
    }

    /// Validate one item. Name lookups and times never reject; only the type
    /// and amounts can.
    pub fn assemble(&self, raw: &RawRecognizedItem) -> Result<RecognitionCandidate, Rejection> {
        let transaction_type = classify(&raw.transaction_type)
            .into_result()?
            .ok_or(Rejection::EmptyType)?;
        let category_id = self.resolve_category(transaction_type, &raw.category_name);
        let time = self.parse_time(&raw.time).into_result()?;
        let source_amount = parse_source_amount(&raw.amount)
            .into_result()?
            .ok_or(Rejection::MissingAmount)?;
        let destination_amount =
            parse_destination_amount(transaction_type, &raw.destination_amount).into_result()?;

        let mut candidate = RecognitionCandidate::new(transaction_type, source_amount);
        candidate.category_id = category_id;
        candidate.time = time;
        candidate.destination_amount = destination_amount;
        candidate.source_account_id =
            non_empty(&raw.account_name).and_then(|name| self.lookups.account(name));
        candidate.destination_account_id =
            non_empty(&raw.destination_account_name).and_then(|name| self.lookups.account(name));
        candidate.tag_ids = self.lookups.tags(raw.tag_names.as_slice());
        candidate.comment = non_empty(&raw.description).map(str::to_string);

        Ok(candidate)
    }

    /// Validate every item, logging and dropping the rejected ones.
    pub fn assemble_all(&self, raws: &[RawRecognizedItem]) -> Vec<RecognitionCandidate> {
        raws.iter()
            .enumerate()
            .filter_map(|(idx, raw)| match self.assemble(raw) {
                Ok(candidate) => Some(candidate),
                Err(rejection) => {
                    match rejection.severity() {
                        Severity::Warning => tracing::warn!("item {idx} skipped: {rejection}"),
                        Severity::Error => tracing::error!("item {idx} rejected: {rejection}"),
                    }
                    None
                }
            })
            .collect()
    }

    fn resolve_category(&self, transaction_type: TransactionType, name: &str) -> Option<CategoryId> {
        let name = non_empty(name)?;
        let found = self.lookups.category(transaction_type, name);
        if found.is_none() {
            tracing::debug!("recognized {transaction_type} category \"{name}\" has no match");
        }
        found
    }

    fn parse_time(&self, raw: &str) -> Stage<i64> {
        if raw.is_empty() {
            return Stage::Omitted;
        }
        let long = normalize_date_text(raw);
        match parse_long_date_time(&long, &self.timezone) {
            Some(ts) => Stage::Value(ts),
            None => {
                tracing::warn!("recognized time \"{raw}\" is invalid");
                Stage::Omitted
            }
        }
    }
}

fn classify(token: &str) -> Stage<TransactionType> {
    if token.is_empty() {
        return Stage::Rejected(Rejection::EmptyType);
    }
    match TransactionType::from_str(token) {
        Ok(t) => Stage::Value(t),
        Err(_) => Stage::Rejected(Rejection::InvalidType(token.to_string())),
    }
}

/// The sign already chose the transaction type; candidates carry magnitudes.
fn parse_source_amount(raw: &str) -> Stage<Money> {
    match Money::parse(raw) {
        Ok(amount) => Stage::Value(amount.abs()),
        Err(AmountError::Empty) => Stage::Rejected(Rejection::MissingAmount),
        Err(_) => Stage::Rejected(Rejection::InvalidAmount(raw.to_string())),
    }
}

/// Only transfers carry a destination amount; a present but unparsable one
/// makes the whole transfer unusable.
fn parse_destination_amount(transaction_type: TransactionType, raw: &str) -> Stage<Money> {
    if transaction_type != TransactionType::Transfer || raw.trim().is_empty() {
        return Stage::Omitted;
    }
    match Money::parse(raw) {
        Ok(amount) => Stage::Value(amount.abs()),
        Err(_) => Stage::Rejected(Rejection::InvalidDestinationAmount(raw.to_string())),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
