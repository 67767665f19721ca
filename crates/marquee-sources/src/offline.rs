//! Stand-in source for when no API token is configured.
//!
//! Lets the watchlist be listed and edited offline; every remote call fails
//! with a permanent error naming the missing token.

use async_trait::async_trait;
use marquee_config::API_TOKEN_ENV;
use marquee_models::MovieId;
use crate::error::FetchError;
use crate::records::{MovieListResponse, MovieRecord};
use crate::MovieSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl OfflineSource {
    fn unavailable() -> FetchError {
        FetchError::Permanent {
            status: None,
            message: format!("No API token configured (set api.access_token or {})", API_TOKEN_ENV),
        }
    }
}

#[async_trait]
impl MovieSource for OfflineSource {
    fn source_name(&self) -> &str {
        "offline"
    }

    async fn now_playing(&self, _page: u32) -> Result<MovieListResponse, FetchError> {
        Err(Self::unavailable())
    }

    async fn search(&self, _query: &str, _page: u32) -> Result<MovieListResponse, FetchError> {
        Err(Self::unavailable())
    }

    async fn movie_details(&self, _movie_id: MovieId) -> Result<MovieRecord, FetchError> {
        Err(Self::unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remote_calls_fail_permanently() {
        let source = OfflineSource;
        let err = source.now_playing(1).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains(API_TOKEN_ENV));
        assert!(source.search("heat", 1).await.is_err());
        assert!(matches!(source.movie_details(1).await, Err(FetchError::Permanent { status: None, .. })));
    }
}
