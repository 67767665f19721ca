use crate::error::FetchError;
use crate::records::{MovieListResponse, MovieRecord};
use crate::tmdb::api;
use crate::traits::MovieSource;
use anyhow::Result;
use async_trait::async_trait;
use marquee_config::ApiConfig;
use marquee_models::MovieId;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    base_url: String,
    access_token: String,
    region: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, access_token, region, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        region: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // Request timeouts live here in the transport, not in the paging core
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            region: region.into(),
        })
    }

    /// Build a client from `[api]` config. The token must already be resolved.
    pub fn from_config(config: &ApiConfig, access_token: String) -> Result<Self> {
        let client = Self::with_timeout(
            config.base_url.clone(),
            access_token,
            config.region.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        info!("TMDB client ready (base: {}, region: {})", client.base_url, client.region);
        Ok(client)
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn now_playing(&self, page: u32) -> Result<MovieListResponse, FetchError> {
        api::get_now_playing(&self.client, &self.base_url, &self.access_token, &self.region, page).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MovieListResponse, FetchError> {
        api::search_movies(&self.client, &self.base_url, &self.access_token, query, page).await
    }

    async fn movie_details(&self, movie_id: MovieId) -> Result<MovieRecord, FetchError> {
        api::get_movie_details(&self.client, &self.base_url, &self.access_token, movie_id).await
    }
}
