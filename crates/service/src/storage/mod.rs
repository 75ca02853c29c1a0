//! Storage abstractions for service layer
//!
//! Contains the file-backed store the ledger persists through.

pub mod json_list_store;
