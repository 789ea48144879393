use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

/// Bit set of features an administrator has withheld from a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRestrictions(u64);

impl FeatureRestrictions {
    pub const NONE: FeatureRestrictions = FeatureRestrictions(0);
    pub const CREATE_TRANSACTION_FROM_IMAGE_RECOGNITION: FeatureRestrictions =
        FeatureRestrictions(1 << 0);

    pub fn from_bits(bits: u64) -> Self {
        FeatureRestrictions(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: FeatureRestrictions) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub username: String,
    pub feature_restrictions: FeatureRestrictions,
}
