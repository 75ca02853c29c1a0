use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// One ledger entry: `user` spent `amount` on `item` at `timestamp`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user: String,
    pub item: String,
    pub amount: f64,
    /// UNIX timestamp (seconds since epoch)
    pub timestamp: u64,
}

/// 创建输入：不包含 id，由服务端生成；timestamp 缺省时取当前时间
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateTransaction {
    pub user: String,
    pub item: String,
    pub amount: f64,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// 部分更新：只修改出现的字段
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateTransaction {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Current UNIX time in seconds; clocks before the epoch read as 0.
pub fn now_unix() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn validation(msg: &str) -> ModelError {
    ModelError::Validation(msg.to_string())
}

impl CreateTransaction {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.user.trim().is_empty() || self.item.trim().is_empty() {
            return Err(validation("user and item must be non-empty strings"));
        }
        if !self.amount.is_finite() {
            return Err(validation("amount must be a finite number"));
        }
        Ok(())
    }

    /// Build the stored entry. Callers validate first.
    pub fn into_transaction(self, now: u64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user: self.user.trim().to_string(),
            item: self.item.trim().to_string(),
            amount: self.amount,
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

impl UpdateTransaction {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.item.is_none() && self.amount.is_none() && self.timestamp.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if matches!(&self.user, Some(u) if u.trim().is_empty()) {
            return Err(validation("user cannot be empty"));
        }
        if matches!(&self.item, Some(i) if i.trim().is_empty()) {
            return Err(validation("item cannot be empty"));
        }
        if matches!(self.amount, Some(a) if !a.is_finite()) {
            return Err(validation("amount must be finite"));
        }
        Ok(())
    }

    pub fn apply_to(&self, tx: &mut Transaction) {
        if let Some(user) = &self.user {
            tx.user = user.trim().to_string();
        }
        if let Some(item) = &self.item {
            tx.item = item.trim().to_string();
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(ts) = self.timestamp {
            tx.timestamp = ts;
        }
    }
}
