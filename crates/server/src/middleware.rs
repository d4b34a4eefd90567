use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Adds `x-process-time` (seconds, as a float) to every response.
pub async fn process_time(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut res = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(v) = HeaderValue::from_str(&elapsed.to_string()) {
        res.headers_mut().insert(PROCESS_TIME_HEADER, v);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn stamps_process_time_header() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(process_time));
        let res = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = res.headers().get(PROCESS_TIME_HEADER).unwrap().to_str().unwrap();
        assert!(v.parse::<f64>().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn stamps_error_responses_too() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(process_time));
        let res = app
            .oneshot(axum::http::Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key(PROCESS_TIME_HEADER));
    }
}
