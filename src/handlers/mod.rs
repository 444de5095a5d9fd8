pub mod bookings;
pub mod dashboard;
pub mod health;
pub mod tours;

use axum::http::HeaderMap;

use crate::errors::AppError;

// The static bearer token stands in for the deployment's session layer;
// handlers only care that the caller holds the admin capability.
pub(crate) fn require_admin(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
