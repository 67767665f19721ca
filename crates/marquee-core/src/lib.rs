pub mod error;
pub mod store;
pub mod paging;
pub mod repository;
pub mod membership;
pub mod search;
pub mod undo;

pub use error::{CoreError, CoreResult, StoreError};
pub use store::{WatchlistSnapshot, WatchlistStore};
pub use paging::{PageLoader, PagingProvider, PagingSession, PagingWindow};
pub use repository::MovieRepository;
pub use membership::{annotate, ListedMovie, WatchlistMembership};
pub use search::{DebouncedSearch, SearchOutcome};
pub use undo::WatchlistUndo;
