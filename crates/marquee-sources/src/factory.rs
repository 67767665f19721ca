//! Builds the configured movie source.
//!
//! There is a single remote catalogue today (TMDB), but callers only ever
//! see `Arc<dyn MovieSource>` so tests and alternative backends can slot in.

use anyhow::Result;
use marquee_config::{Config, API_TOKEN_ENV};
use std::sync::Arc;
use crate::tmdb::TmdbClient;
use crate::MovieSource;

/// Create the movie source described by `config`
pub fn create_source(config: &Config) -> Result<Arc<dyn MovieSource>> {
    let token = config.api.resolved_token().ok_or_else(|| {
        anyhow::anyhow!(
            "TMDB access token is not configured (set api.access_token or {})",
            API_TOKEN_ENV
        )
    })?;

    let client = TmdbClient::from_config(&config.api, token)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_source_with_token() {
        let mut config = Config::default();
        config.api.access_token = "token".to_string();
        let source = create_source(&config).unwrap();
        assert_eq!(source.source_name(), "tmdb");
    }
}
