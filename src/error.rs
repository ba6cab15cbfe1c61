use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Failure taxonomy for the whole API. Every handler error converges here
/// and is rendered as a `{message}` JSON body with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// Duplicate unique key. Surfaces as 400, matching the register contract.
    #[error("{0}")]
    Conflict(String),
    /// Credential mismatch during login or social verification. 400, unlike
    /// token failures which are 401 — the asymmetry is observable API
    /// behavior and kept.
    #[error("{0}")]
    Auth(String),
    /// Missing, malformed, or expired bearer token.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// External identity provider could not be reached or answered garbage.
    #[error("{0}")]
    Upstream(String),
    /// Unexpected persistence failure. The client sees a generic message;
    /// the source error goes to the log.
    #[error("database error")]
    Store(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::Auth(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Store(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // The only unique key in the schema is users.email, so a unique-key
        // violation always means a duplicate registration.
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return ApiError::Conflict("User already exists".into());
            }
        }
        ApiError::Store(err)
    }
}

/// Failure reported by an identity-provider adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider examined the credential and turned it down.
    #[error("{0}")]
    Rejected(String),
    /// The provider was unreachable or its answer was unusable.
    #[error("{0}")]
    Upstream(String),
}

/// `Json` wrapper that reports malformed bodies as a 400 validation failure
/// instead of axum's default 422.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rej: JsonRejection| ApiError::Validation(rej.body_text()))?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_message(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        (status, value["message"].as_str().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_message() {
        let (status, message) = body_message(ApiError::Validation("Email and password required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Email and password required");
    }

    #[tokio::test]
    async fn conflict_maps_to_400() {
        let (status, message) = body_message(ApiError::Conflict("User already exists".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "User already exists");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let (status, _) = body_message(ApiError::Unauthorized("Invalid or expired token".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, message) = body_message(ApiError::NotFound("Car not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Car not found");
    }

    #[tokio::test]
    async fn upstream_maps_to_500() {
        let (status, _) = body_message(ApiError::Upstream("GitHub token exchange failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn store_hides_the_database_error() {
        let (status, message) = body_message(ApiError::Store(sqlx::Error::PoolClosed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "database error");
    }
}
