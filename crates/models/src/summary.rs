use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Per-user rollup returned by `/users/:user/summary`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub user: String,
    pub count: usize,
    pub total_amount: f64,
    pub transactions: Vec<Transaction>,
}

impl UserSummary {
    /// Exact, case-sensitive match on `user`; ledger order is kept.
    pub fn from_ledger(user: &str, ledger: &[Transaction]) -> Self {
        let transactions: Vec<Transaction> =
            ledger.iter().filter(|t| t.user == user).cloned().collect();
        let total_amount = transactions.iter().map(|t| t.amount).sum();
        Self {
            user: user.to_string(),
            count: transactions.len(),
            total_amount,
            transactions,
        }
    }
}
