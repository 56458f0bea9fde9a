use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::{TokenError, validate_jwt};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Where the credential came from, if anywhere
enum Credential {
    Missing,
    Present(String),
}

fn extract_credential(req: &Request) -> Credential {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        return match token {
            Some(t) => Credential::Present(t.to_string()),
            None => Credential::Missing,
        };
    }

    // Browsers opening the PDF in a new tab cannot set headers
    let query = req.uri().query().unwrap_or_default();
    match serde_urlencoded::from_str::<AuthQuery>(query)
        .ok()
        .and_then(|q| q.token)
        .filter(|t| !t.trim().is_empty())
    {
        Some(t) => Credential::Present(t.trim().to_string()),
        None => Credential::Missing,
    }
}

/// 401 without a credential, 403 with one that fails verification.
/// On success the token's `Claims` are added to the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match extract_credential(&req) {
        Credential::Present(token) => token,
        Credential::Missing => {
            return Err(AppError::Unauthorized("Access token required".to_string()));
        }
    };

    match validate_jwt(&token, &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!("🔒 Rejected token on {} {}: {}", req.method(), req.uri().path(), e);
            let message = match e {
                TokenError::Expired => "Token has expired",
                _ => "Invalid or expired token",
            };
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}
