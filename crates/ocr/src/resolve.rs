use std::collections::HashMap;

use billsnap_core::{Account, AccountId, Category, CategoryId, Tag, TagId, TransactionType};

/// Name → id tables built once per batch from the user's current data.
///
/// Only visible records are indexed. Category tables are split by
/// transaction type and hold second-level categories only. When two records
/// share a name, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    accounts: HashMap<String, AccountId>,
    expense_categories: HashMap<String, CategoryId>,
    income_categories: HashMap<String, CategoryId>,
    transfer_categories: HashMap<String, CategoryId>,
    tags: HashMap<String, TagId>,
}

impl LookupTables {
    pub fn build(accounts: &[Account], categories: &[Category], tags: &[Tag]) -> Self {
        let mut tables = LookupTables {
            accounts: accounts
                .iter()
                .filter(|a| !a.hidden)
                .map(|a| (a.name.clone(), a.id))
                .collect(),
            tags: tags
                .iter()
                .filter(|t| !t.hidden)
                .map(|t| (t.name.clone(), t.id))
                .collect(),
            ..Default::default()
        };

        for category in categories.iter().filter(|c| c.is_selectable()) {
            tables
                .category_table_mut(category.category_type)
                .insert(category.name.clone(), category.id);
        }

        tables
    }

    pub fn account(&self, name: &str) -> Option<AccountId> {
        self.accounts.get(name).copied()
    }

    /// Look a category up in the table for `transaction_type` only.
    pub fn category(&self, transaction_type: TransactionType, name: &str) -> Option<CategoryId> {
        self.category_table(transaction_type).get(name).copied()
    }

    pub fn tag(&self, name: &str) -> Option<TagId> {
        self.tags.get(name).copied()
    }

    /// Resolve tag names in order, dropping names with no visible tag.
    pub fn tags<S: AsRef<str>>(&self, names: &[S]) -> Vec<TagId> {
        names.iter().filter_map(|n| self.tag(n.as_ref())).collect()
    }

    fn category_table(&self, transaction_type: TransactionType) -> &HashMap<String, CategoryId> {
        match transaction_type {
            TransactionType::Expense => &self.expense_categories,
            TransactionType::Income => &self.income_categories,
            TransactionType::Transfer => &self.transfer_categories,
        }
    }

    fn category_table_mut(
        &mut self,
        transaction_type: TransactionType,
    ) -> &mut HashMap<String, CategoryId> {
        match transaction_type {
            TransactionType::Expense => &mut self.expense_categories,
            TransactionType::Income => &mut self.income_categories,
            TransactionType::Transfer => &mut self.transfer_categories,
        }
    }
}
