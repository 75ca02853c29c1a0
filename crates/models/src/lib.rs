//! Ledger entities and input models shared by the service and HTTP layers.

pub mod errors;
pub mod transaction;
pub mod summary;

pub use transaction::{now_unix, CreateTransaction, Transaction, UpdateTransaction};
pub use summary::UserSummary;
