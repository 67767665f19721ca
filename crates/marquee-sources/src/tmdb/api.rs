use crate::error::FetchError;
use crate::records::{MovieListResponse, MovieRecord};
use marquee_models::MovieId;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Error body TMDB sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct TmdbStatus {
    #[serde(default)]
    status_message: Option<String>,
}

fn authorized(request: RequestBuilder, access_token: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("accept", "application/json")
}

/// Send a GET and decode the JSON body, classifying failures
async fn get_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<TmdbStatus>(&body)
            .ok()
            .and_then(|s| s.status_message)
            .unwrap_or_default();
        warn!("Failed to fetch {}: {} {}", what, status, detail);
        return Err(FetchError::from_status(status.as_u16(), &detail));
    }

    serde_json::from_str(&body)
        .map_err(|e| FetchError::malformed(format!("Failed to parse {} response: {}", what, e)))
}

/// Fetch one page of now-playing movies
pub async fn get_now_playing(
    client: &Client,
    base_url: &str,
    access_token: &str,
    region: &str,
    page: u32,
) -> Result<MovieListResponse, FetchError> {
    let url = format!("{}/movie/now_playing", base_url);
    debug!("GET {} region={} page={}", url, region, page);

    let request = authorized(client.get(&url), access_token)
        .query(&[("region", region.to_string()), ("page", page.to_string())]);

    get_json(request, "now playing").await
}

/// Fetch one page of search results
pub async fn search_movies(
    client: &Client,
    base_url: &str,
    access_token: &str,
    query: &str,
    page: u32,
) -> Result<MovieListResponse, FetchError> {
    let url = format!("{}/search/movie", base_url);
    debug!("GET {} query={:?} page={}", url, query, page);

    let request = authorized(client.get(&url), access_token)
        .query(&[("query", query.to_string()), ("page", page.to_string())]);

    get_json(request, "search").await
}

/// Fetch a single movie; a 404 becomes `FetchError::NotFound`
pub async fn get_movie_details(
    client: &Client,
    base_url: &str,
    access_token: &str,
    movie_id: MovieId,
) -> Result<MovieRecord, FetchError> {
    let url = format!("{}/movie/{}", base_url, movie_id);
    debug!("GET {}", url);

    let request = authorized(client.get(&url), access_token);

    match get_json(request, "movie details").await {
        Err(FetchError::Permanent { status: Some(404), .. }) => Err(FetchError::NotFound(movie_id)),
        other => other,
    }
}
