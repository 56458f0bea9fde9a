use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Reuses an incoming `x-request-id` or assigns a fresh one, and echoes it
/// on the response.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .cloned()
        .unwrap_or_else(fresh_id);

    req.headers_mut()
        .insert(X_REQUEST_ID.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), request_id);

    response
}

fn fresh_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
