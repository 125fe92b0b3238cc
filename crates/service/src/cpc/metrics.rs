use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

// Prometheus metrics (default registry)
pub static PARTNER_CALLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cpc_partner_calls_total",
        "Partner CPC API calls by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .expect("register cpc_partner_calls_total")
});

pub static DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cpc_decisions_total",
        "Can-contact decisions by result",
        &["result"]
    )
    .expect("register cpc_decisions_total")
});

pub fn record_call(endpoint: &str, outcome: &str) {
    PARTNER_CALLS_TOTAL.with_label_values(&[endpoint, outcome]).inc();
}

pub fn record_decision(allowed: bool) {
    DECISIONS_TOTAL
        .with_label_values(&[if allowed { "allowed" } else { "denied" }])
        .inc();
}
