//! Owner identification.
//!
//! Sign-in happens upstream; by the time a request reaches this service the
//! identity provider has put the caller's id in the `X-Owner-Id` header.
//! The id is used as a partition key and never interpreted.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::ApiError;
use crate::models::OwnerId;

pub const OWNER_HEADER: &str = "x-owner-id";

/// The authenticated owner of the current request.
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("missing X-Owner-Id header".to_string()))?;

        let id = value
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("X-Owner-Id is not valid text".to_string()))?
            .trim();
        if id.is_empty() {
            return Err(ApiError::Unauthenticated("empty X-Owner-Id header".to_string()));
        }

        Ok(Owner(OwnerId::from(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Owner, ApiError> {
        let mut builder = Request::builder().uri("/api/decks");
        if let Some(value) = header {
            builder = builder.header(OWNER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_owner_from_header() {
        let owner = extract(Some(" user-42 ")).await.unwrap();
        assert_eq!(owner.0.as_str(), "user-42");
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_unauthenticated() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthenticated(_))));
        assert!(matches!(extract(Some("  ")).await, Err(ApiError::Unauthenticated(_))));
    }
}
