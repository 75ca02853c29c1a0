use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder};

// Prometheus metrics (default registry)
pub static TRANSACTIONS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "myday_transactions_created_total",
        "Total transactions created"
    )
    .expect("register transactions_created_total")
});

pub static TRANSACTIONS_UPDATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "myday_transactions_updated_total",
        "Total transactions updated"
    )
    .expect("register transactions_updated_total")
});

pub static TRANSACTIONS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "myday_transactions_deleted_total",
        "Total transactions deleted"
    )
    .expect("register transactions_deleted_total")
});

pub static PERSIST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "myday_persist_failures_total",
        "Total ledger writes that failed"
    )
    .expect("register persist_failures_total")
});

pub static TRANSACTIONS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "myday_transactions_stored",
        "Transactions currently in the ledger"
    )
    .expect("register transactions_stored")
});

pub fn set_stored(count: usize) {
    TRANSACTIONS_STORED.set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Touch every metric so they show up in `/metrics` before first use.
pub fn init() {
    Lazy::force(&TRANSACTIONS_CREATED_TOTAL);
    Lazy::force(&TRANSACTIONS_UPDATED_TOTAL);
    Lazy::force(&TRANSACTIONS_DELETED_TOTAL);
    Lazy::force(&PERSIST_FAILURES_TOTAL);
    Lazy::force(&TRANSACTIONS_STORED);
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

pub async fn metrics_handler() -> impl IntoResponse {
    let (status, body) = encode_metrics();
    (status, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
