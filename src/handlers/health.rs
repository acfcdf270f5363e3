use actix_web::{HttpResponse, Result};

use crate::models::HealthResponse;

/// Liveness probe; never touches the identity provider
///
/// # Errors
///
/// Never fails; the `Result` matches the other handlers.
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
