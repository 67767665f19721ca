pub mod config;
pub mod paths;
pub mod session;

pub use config::{ApiConfig, Config, PagingConfig, SearchConfig, StorageConfig, API_TOKEN_ENV};
pub use paths::{PathManager, container_base_path};
pub use session::SessionStore;
