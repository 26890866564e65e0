use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Storage Metrics
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "store_operations_total",
        "Total number of attempt store operations",
        &["operation", "backend", "status"]
    )
    .unwrap();

    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "store_operation_duration_seconds",
        "Attempt store operation duration in seconds",
        &["operation", "backend"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref ATTEMPTS_LOGGED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempts_logged_total",
        "Total number of attempts saved",
        &["source"]
    )
    .unwrap();

    pub static ref ATTEMPTS_REJECTED_TOTAL: IntCounter = register_int_counter!(
        "attempts_rejected_total",
        "Total number of attempt submissions rejected by validation"
    )
    .unwrap();

    pub static ref CLASSIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "classifications_total",
        "Total number of classification requests",
        &["question_type"]
    )
    .unwrap();

    pub static ref PRACTICE_SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "practice_sessions_total",
        "Total number of practice sessions",
        &["status"]
    )
    .unwrap();

    pub static ref PRACTICE_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "practice_sessions_active",
        "Number of practice sessions currently held in memory"
    )
    .unwrap();

    pub static ref PRACTICE_ANSWERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "practice_answers_total",
        "Total number of practice answers checked",
        &["correct"]
    )
    .unwrap();

    pub static ref EXPORTS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "exports_generated_total",
        "Total number of exports generated",
        &["format"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track attempt store operation with metrics
pub async fn track_store_operation<F, T, E>(
    operation: &str,
    backend: &str,
    future: F,
) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, backend, status])
        .inc();

    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, backend])
        .observe(duration);

    result
}
