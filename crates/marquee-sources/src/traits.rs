use async_trait::async_trait;
use marquee_models::MovieId;
use crate::error::FetchError;
use crate::records::{MovieListResponse, MovieRecord};

/// Remote movie catalogue: the three calls the core needs, nothing more
#[async_trait]
pub trait MovieSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// One page of the now-playing listing (1-based)
    async fn now_playing(&self, page: u32) -> Result<MovieListResponse, FetchError>;

    /// One page of search results for `query` (1-based)
    async fn search(&self, query: &str, page: u32) -> Result<MovieListResponse, FetchError>;

    /// A single movie. Missing ids are reported as `FetchError::NotFound`.
    async fn movie_details(&self, movie_id: MovieId) -> Result<MovieRecord, FetchError>;
}
