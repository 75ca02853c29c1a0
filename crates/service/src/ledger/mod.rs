//! Ledger storage abstraction.
//!
//! Handlers hold an `Arc<dyn TransactionStore>`; the file-backed
//! implementation lives in `crate::file::transaction_store`.

use async_trait::async_trait;
use models::{CreateTransaction, Transaction, UpdateTransaction, UserSummary};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Listing options: exact user match and optional paging.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFilter {
    pub user: Option<String>,
    pub pagination: Option<Pagination>,
}

impl ListFilter {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self { user: Some(user.into()), pagination: None }
    }

    /// Apply the filter to ledger entries, keeping ledger order.
    pub fn apply(&self, items: &[Transaction]) -> Vec<Transaction> {
        let matching = items
            .iter()
            .filter(|t| self.user.as_deref().map_or(true, |u| t.user == u));
        match self.pagination {
            Some(p) => {
                let (offset, limit) = p.normalize();
                matching.skip(offset).take(limit).cloned().collect()
            }
            None => matching.cloned().collect(),
        }
    }
}

/// Trait abstraction for ledger storage (CRUD of transactions plus rollups).
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn list(&self, filter: &ListFilter) -> Vec<Transaction>;
    async fn get(&self, id: Uuid) -> Option<Transaction>;
    async fn create(&self, input: CreateTransaction) -> Result<Transaction, ServiceError>;
    async fn update(&self, id: Uuid, input: UpdateTransaction) -> Result<Transaction, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn summary(&self, user: &str) -> UserSummary;
    async fn count(&self) -> usize;
}
