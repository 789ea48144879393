use std::future::Future;

use thiserror::Error;

use crate::account::Account;
use crate::category::Category;
use crate::tag::Tag;
use crate::user::{User, UserId};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Data source error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DataError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Backend(Box::new(err))
    }
}

/// Read access to a user's bookkeeping data.
///
/// Implementations return everything the user owns, hidden records included;
/// callers decide what is visible.
pub trait BookkeepingData: Send + Sync {
    fn get_user(&self, uid: UserId) -> impl Future<Output = Result<User, DataError>> + Send;

    fn get_all_accounts(
        &self,
        uid: UserId,
    ) -> impl Future<Output = Result<Vec<Account>, DataError>> + Send;

    fn get_all_categories(
        &self,
        uid: UserId,
    ) -> impl Future<Output = Result<Vec<Category>, DataError>> + Send;

    fn get_all_tags(&self, uid: UserId) -> impl Future<Output = Result<Vec<Tag>, DataError>> + Send;
}
