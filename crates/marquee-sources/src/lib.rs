pub mod traits;
pub mod records;
pub mod factory;
pub mod tmdb;
pub mod error;
pub mod offline;

pub use traits::MovieSource;
pub use records::{MovieListResponse, MovieRecord};
pub use factory::create_source;
pub use error::FetchError;
pub use tmdb::TmdbClient;
pub use offline::OfflineSource;
