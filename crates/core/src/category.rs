use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::TransactionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parent id carried by first-level categories. It names no real category;
/// it only marks the root of the category tree.
pub const LEVEL_ONE_CATEGORY_PARENT_ID: CategoryId = CategoryId(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub category_type: TransactionType,
    pub parent_id: CategoryId,
    pub hidden: bool,
}

impl Category {
    /// A first-level category (direct child of the tree root).
    pub fn level_one(id: i64, name: &str, category_type: TransactionType) -> Self {
        Category {
            id: CategoryId(id),
            name: name.to_string(),
            category_type,
            parent_id: LEVEL_ONE_CATEGORY_PARENT_ID,
            hidden: false,
        }
    }

    /// A second-level category under `parent`.
    pub fn child_of(parent: &Category, id: i64, name: &str) -> Self {
        Category {
            id: CategoryId(id),
            name: name.to_string(),
            category_type: parent.category_type,
            parent_id: parent.id,
            hidden: false,
        }
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn is_level_one(&self) -> bool {
        self.parent_id == LEVEL_ONE_CATEGORY_PARENT_ID
    }

    /// Whether a recognized category name may resolve to this category.
    /// Hidden and first-level categories never do.
    pub fn is_selectable(&self) -> bool {
        !self.hidden && !self.is_level_one()
    }
}
