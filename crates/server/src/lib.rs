pub mod routes;
pub mod startup;
pub mod errors;
pub mod metrics;
pub mod openapi;

pub use startup::{build_app, build_state, run, run_until};
