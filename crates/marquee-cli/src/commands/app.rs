use color_eyre::Result;
use marquee_config::{Config, PathManager};
use marquee_core::{MovieRepository, WatchlistStore};
use marquee_sources::{create_source, OfflineSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, built from the config file on disk
pub struct App {
    pub config: Config,
    store: WatchlistStore,
}

impl App {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

        let database_file = database_path(&config, &paths);
        let store = WatchlistStore::open(&database_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to open watchlist at {}: {}", database_file.display(), e))?;

        Ok(Self { config, store })
    }

    /// Repository over the configured remote. Fails without an API token.
    pub fn repository(&self) -> Result<MovieRepository> {
        self.config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("{}\nRun 'marquee config init' to create a configuration.", e))?;
        let source = create_source(&self.config).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
        Ok(MovieRepository::new(source, self.store.clone()))
    }

    /// Repository for watchlist work. Without an API token the watchlist is
    /// still readable and editable; only remote lookups fail.
    pub fn watchlist_repository(&self) -> MovieRepository {
        match create_source(&self.config) {
            Ok(source) => MovieRepository::new(source, self.store.clone()),
            Err(e) => {
                debug!("Watchlist opened offline: {}", e);
                MovieRepository::new(Arc::new(OfflineSource), self.store.clone())
            }
        }
    }
}

fn database_path(config: &Config, paths: &PathManager) -> PathBuf {
    config
        .storage
        .database_file
        .clone()
        .unwrap_or_else(|| paths.database_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchlist_repository_without_token_is_offline() {
        let app = App {
            config: Config::default(),
            store: WatchlistStore::open_in_memory().unwrap(),
        };
        if app.config.api.resolved_token().is_none() {
            assert_eq!(app.watchlist_repository().source_name(), "offline");
            assert!(app.repository().is_err());
        }
    }

    #[test]
    fn test_database_path_prefers_config() {
        let paths = PathManager::with_base(PathBuf::from("/tmp/marquee"));
        let mut config = Config::default();
        assert_eq!(database_path(&config, &paths), PathBuf::from("/tmp/marquee/data/watchlist.db"));

        config.storage.database_file = Some(PathBuf::from("/srv/watchlist.db"));
        assert_eq!(database_path(&config, &paths), PathBuf::from("/srv/watchlist.db"));
    }
}
