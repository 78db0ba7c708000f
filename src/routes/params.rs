use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Home page filters. Both are optional and an empty value counts as absent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HomeQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// A single id path segment. A segment that is not a UUID cannot name any
/// record, so it is rejected as `NotFound` instead of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub Uuid);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        match Uuid::parse_str(&raw) {
            Ok(id) => Ok(ResourceId(id)),
            Err(_) => {
                tracing::debug!(segment = %raw, "path segment is not an id");
                Err(AppError::NotFound)
            }
        }
    }
}
