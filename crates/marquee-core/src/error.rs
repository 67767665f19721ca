use marquee_models::ListingContext;
use marquee_sources::FetchError;

/// Failure in the local watchlist store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Watchlist database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Watchlist database I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watchlist store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Remote failures pass through unchanged in kind
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Page numbers start at 1")]
    InvalidPage,

    #[error("Cannot load page {requested} of {context}: next page is {expected}")]
    PageOutOfOrder {
        context: ListingContext,
        expected: u32,
        requested: u32,
    },

    #[error("Page load for {0} was cancelled")]
    Cancelled(ListingContext),

    #[error("Paging provider has been disposed")]
    Disposed,
}

impl CoreError {
    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Fetch(e) => e.is_retryable(),
            CoreError::Cancelled(_) => true,
            _ => false,
        }
    }

    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            CoreError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
