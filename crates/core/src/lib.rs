pub mod account;
pub mod category;
pub mod datetime;
pub mod money;
pub mod source;
pub mod tag;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountId};
pub use category::{Category, CategoryId, LEVEL_ONE_CATEGORY_PARENT_ID};
pub use money::{AmountError, Money};
pub use source::{BookkeepingData, DataError};
pub use tag::{Tag, TagId};
pub use transaction::TransactionType;
pub use user::{FeatureRestrictions, User, UserId};
