use marquee_models::{Movie, MovieId};
use serde::{Deserialize, Serialize};

/// Movie as it appears on the wire, in listings and in the details endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Paginated envelope shared by listing and search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieListResponse {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieRecord>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl MovieListResponse {
    /// Whether the remote reports pages after this one
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Movie {
            id: record.id,
            title: record.title,
            overview: record.overview.unwrap_or_default(),
            poster_path: record.poster_path.filter(|p| !p.is_empty()),
            release_date: record.release_date.filter(|d| !d.is_empty()),
        }
    }
}
