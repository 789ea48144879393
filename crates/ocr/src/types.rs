use billsnap_core::{AccountId, CategoryId, Money, TagId, TransactionType};
use serde::{Deserialize, Serialize};

/// A transaction fragment as read off the image, before any validation.
///
/// Every field is free text. Empty strings mean "not recognized".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecognizedItem {
    /// `income`, `expense`, `transfer`, or empty.
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub time: String,
    pub amount: String,
    /// Only meaningful for transfers.
    pub destination_amount: String,
    pub account_name: String,
    pub destination_account_name: String,
    pub category_name: String,
    pub tag_names: Vec<String>,
    pub description: String,
}

/// A validated transaction ready for the user to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionCandidate {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Unix seconds; absent when the recognized time did not parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    pub source_amount: Money,
    /// Set only for transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RecognitionCandidate {
    pub fn new(transaction_type: TransactionType, source_amount: Money) -> Self {
        Self {
            transaction_type,
            time: None,
            source_amount,
            destination_amount: None,
            source_account_id: None,
            destination_account_id: None,
            category_id: None,
            tag_ids: vec![],
            comment: None,
        }
    }
}

/// The envelope handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub transactions: Vec<RecognitionCandidate>,
}
