// src/utils/prometheus_metrics.rs

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_histogram, Counter, Histogram};

// Metrics from Producer
pub static MESSAGES_PUBLISHED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "producer_messages_published_total",
        "Total number of demo messages published."
    )
    .expect("Failed to register MESSAGES_PUBLISHED_TOTAL counter")
});

pub static MESSAGE_PUBLISH_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "producer_message_publish_errors_total",
        "Total number of errors during publishing (serialization, broker)."
    )
    .expect("Failed to register MESSAGE_PUBLISH_ERRORS_TOTAL counter")
});

pub static MESSAGE_PUBLISHING_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "producer_message_publishing_duration_seconds",
        "Histogram of publish call latencies (no broker confirmation is awaited)."
    )
    .expect("Failed to register MESSAGE_PUBLISHING_DURATION_SECONDS histogram")
});

// Metrics from Consumer
pub static MESSAGES_CONSUMED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "consumer_messages_consumed_total",
        "Total number of deliveries received by the consumer."
    )
    .expect("Failed to register consumer_messages_consumed_total counter")
});

pub static MESSAGE_HANDLER_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "consumer_message_handler_errors_total",
        "Total number of deliveries lost because the handler failed."
    )
    .expect("Failed to register consumer_message_handler_errors_total counter")
});
