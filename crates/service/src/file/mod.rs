//! File-backed implementations of the service traits.

pub mod transaction_store;
