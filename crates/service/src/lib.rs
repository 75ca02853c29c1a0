//! Service layer: ledger business rules on top of `models`.
//! - Separates ledger rules from the HTTP layer.
//! - Reuses validation and entity definitions in `models` crate.
//! - Persists through a JSON file store under the data root.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod pagination;
pub mod ledger;
pub mod file;

pub use file::transaction_store::FileTransactionStore;
pub use ledger::{ListFilter, TransactionStore};
