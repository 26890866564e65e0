use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per route template.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_label(&req);

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &route, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &route])
        .observe(start.elapsed().as_secs_f64());

    response
}

/// The router's path template when one matched, otherwise the raw path with
/// id-like segments collapsed so unknown URLs cannot blow up label cardinality.
fn route_label(req: &Request) -> String {
    match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(req.uri().path()),
    }
}

fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_id_like(segment) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// UUIDs (8-4-4-4-12 hex) and plain numbers.
fn is_id_like(segment: &str) -> bool {
    let uuid = segment.len() == 36 && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
    let numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
    uuid || numeric
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_paths_collapse_ids() {
        assert_eq!(
            normalize_path("/api/v1/practice/sessions/550e8400-e29b-41d4-a716-446655440000/answer"),
            "/api/v1/practice/sessions/{id}/answer"
        );
        assert_eq!(normalize_path("/api/v1/attempts/42"), "/api/v1/attempts/{id}");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn id_detection() {
        assert!(is_id_like("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_id_like("123"));
        assert!(!is_id_like("not-a-uuid"));
        assert!(!is_id_like("export.csv"));
        assert!(!is_id_like(""));
    }

    #[test]
    fn raw_path_used_without_a_route_match() {
        let req = Request::builder()
            .uri("/api/v1/practice/sessions/77")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(route_label(&req), "/api/v1/practice/sessions/{id}");
    }
}
