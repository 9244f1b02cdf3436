//! Path extractors for entity ids.
//!
//! `PathId` and `PathIds` parse UUID path segments and reject bad ones
//! with the standard JSON error body instead of axum's plain-text 400.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use foncier_core::EntityId;
use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};

/// A single UUID path parameter.
///
/// ```rust,ignore
/// async fn get_notes(PathId(parcel_id): PathId) -> ApiResult<impl IntoResponse> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub EntityId);

/// Error returned when an id segment is not a UUID.
#[derive(Debug)]
pub struct PathIdError {
    pub path_param: String,
    pub message: String,
}

impl std::fmt::Display for PathIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid id in '{}': {}", self.path_param, self.message)
    }
}

impl std::error::Error for PathIdError {}

impl IntoResponse for PathIdError {
    fn into_response(self) -> Response {
        ApiError::new(ErrorCode::InvalidFormat, self.to_string())
            .with_details(serde_json::json!({ "path_param": self.path_param }))
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(uuid): Path<Uuid> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract UUID from path: {}", e),
            })?;

        Ok(PathId(uuid))
    }
}

/// Two UUID path parameters, e.g. `/parcels/:id/notes/:note_id`.
#[derive(Debug, Clone, Copy)]
pub struct PathIds(pub EntityId, pub EntityId);

#[async_trait]
impl<S> FromRequestParts<S> for PathIds
where
    S: Send + Sync,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(Uuid, Uuid)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract UUIDs from path: {}", e),
            })?;

        Ok(PathIds(first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_path_id_error_display() {
        let err = PathIdError {
            path_param: "/api/parcels/not-a-uuid/notes".to_string(),
            message: "not a valid UUID".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("not-a-uuid"));
        assert!(display.contains("not a valid UUID"));
    }

    #[test]
    fn test_path_id_error_is_bad_request() {
        let err = PathIdError {
            path_param: "/x".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
