use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use rand::Rng;
use std::fmt::Write;
use std::time::Instant;

/// Generate a 16-character hex trace ID (8 random bytes).
fn generate_trace_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    let mut s = String::with_capacity(16);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Format elapsed time as a human-readable string.
fn format_elapsed(elapsed_us: u128) -> String {
    if elapsed_us < 1000 {
        format!("{elapsed_us}µs")
    } else if elapsed_us < 1_000_000 {
        format!("{}ms", elapsed_us / 1000)
    } else {
        format!("{:.1}s", elapsed_us as f64 / 1_000_000.0)
    }
}

/// Request/response logging middleware. Each request gets a random trace id
/// that is logged on both lines and returned in the `X-Trace-Id` header.
pub async fn request_logging(req: Request, next: Next) -> Response {
    let trace_id = generate_trace_id();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    tracing::info!(trace_id = %trace_id, method = %method, path = %path, "--> request");

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = format_elapsed(start.elapsed().as_micros());

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(trace_id = %trace_id, status = status.as_u16(), elapsed = %elapsed, "<-- response");
    } else if status.is_client_error() {
        tracing::warn!(trace_id = %trace_id, status = status.as_u16(), elapsed = %elapsed, "<-- response");
    } else {
        tracing::info!(trace_id = %trace_id, status = status.as_u16(), elapsed = %elapsed, "<-- response");
    }

    if let Ok(val) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", val);
    }

    response
}
