use crate::error::CoreResult;
use crate::membership::WatchlistMembership;
use crate::paging::{PageLoader, PagingProvider};
use crate::store::{WatchlistSnapshot, WatchlistStore};
use async_trait::async_trait;
use marquee_config::PagingConfig;
use marquee_models::{ListingContext, Movie, MovieId, Page};
use marquee_sources::{FetchError, MovieListResponse, MovieSource};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

/// Single entry point for remote listings and the local watchlist.
///
/// Remote calls go straight to the `MovieSource`; watchlist calls go to the
/// `WatchlistStore`. Nothing here caches remote data, that is the paging
/// provider's job.
#[derive(Clone)]
pub struct MovieRepository {
    source: Arc<dyn MovieSource>,
    store: WatchlistStore,
}

fn to_page(page_number: u32, response: MovieListResponse) -> Page {
    let has_more = response.has_more();
    let items = response.results.into_iter().map(Movie::from).collect();
    Page::new(page_number, items, has_more)
}

impl MovieRepository {
    pub fn new(source: Arc<dyn MovieSource>, store: WatchlistStore) -> Self {
        Self { source, store }
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    pub(crate) fn store(&self) -> &WatchlistStore {
        &self.store
    }

    pub async fn get_now_playing_page(&self, page: u32) -> Result<Page, FetchError> {
        debug!("Fetching now playing page {} from {}", page, self.source.source_name());
        let response = self.source.now_playing(page).await?;
        Ok(to_page(page, response))
    }

    /// A blank query yields an empty final page without a remote call
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Page, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page::empty(page));
        }
        debug!("Searching {} for {:?} (page {})", self.source.source_name(), query, page);
        let response = self.source.search(query, page).await?;
        Ok(to_page(page, response))
    }

    pub async fn fetch_movie_details(&self, id: MovieId) -> Result<Movie, FetchError> {
        let record = self.source.movie_details(id).await?;
        Ok(Movie::from(record))
    }

    /// Live watchlist. Each subscriber is independent and starts at the current contents.
    pub fn get_watchlist(&self) -> WatchStream<Arc<WatchlistSnapshot>> {
        WatchStream::new(self.store.subscribe())
    }

    pub fn watchlist_snapshot(&self) -> Arc<WatchlistSnapshot> {
        self.store.snapshot()
    }

    /// Idempotent; re-adding refreshes the stored fields in place
    pub async fn add_to_watchlist(&self, movie: &Movie) -> CoreResult<()> {
        self.store.upsert(movie.clone()).await?;
        info!("Added {} ({}) to watchlist", movie.title, movie.id);
        Ok(())
    }

    /// Removing a movie that is not on the watchlist is a no-op
    pub async fn remove_from_watchlist(&self, movie: &Movie) -> CoreResult<()> {
        self.remove_by_id(movie.id).await.map(|_| ())
    }

    pub async fn remove_by_id(&self, id: MovieId) -> CoreResult<bool> {
        let removed = self.store.delete(id).await?;
        if removed {
            info!("Removed {} from watchlist", id);
        }
        Ok(removed)
    }

    /// The stored copy of a watchlisted movie
    pub async fn watchlist_entry(&self, id: MovieId) -> CoreResult<Option<Movie>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn is_in_watchlist(&self, id: MovieId) -> CoreResult<bool> {
        Ok(self.store.exists(id).await?)
    }

    pub fn membership(&self) -> WatchlistMembership {
        WatchlistMembership::new(self.store.subscribe())
    }

    /// Paging provider that loads through this repository
    pub fn paging(&self, config: PagingConfig) -> PagingProvider {
        PagingProvider::new(Arc::new(self.clone()), config)
    }
}

#[async_trait]
impl PageLoader for MovieRepository {
    async fn load_page(&self, context: &ListingContext, page: u32) -> Result<Page, FetchError> {
        match context {
            ListingContext::NowPlaying => self.get_now_playing_page(page).await,
            ListingContext::Search(query) => self.search_movies(query, page).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::StreamExt;
    use marquee_sources::MovieRecord;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) fn record(id: MovieId, title: &str) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            overview: Some(format!("{} overview", title)),
            poster_path: Some(format!("/{}.jpg", id)),
            release_date: Some("2024-01-01".to_string()),
        }
    }

    /// In-memory catalogue keyed by search query ("" for now playing)
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub listings: Mutex<HashMap<(String, u32), Result<MovieListResponse, FetchError>>>,
        pub details: Mutex<HashMap<MovieId, Result<MovieRecord, FetchError>>>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn listing(&self, query: &str, page: u32, records: Vec<MovieRecord>, total_pages: u32) {
            let total_results = records.len() as u32;
            self.listings.lock().unwrap().insert(
                (query.to_string(), page),
                Ok(MovieListResponse {
                    page,
                    results: records,
                    total_pages,
                    total_results,
                }),
            );
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn lookup(&self, query: &str, page: u32) -> Result<MovieListResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.listings
                .lock()
                .unwrap()
                .get(&(query.to_string(), page))
                .cloned()
                .unwrap_or_else(|| {
                    Ok(MovieListResponse {
                        page,
                        results: Vec::new(),
                        total_pages: 0,
                        total_results: 0,
                    })
                })
        }
    }

    #[async_trait]
    impl MovieSource for FakeSource {
        fn source_name(&self) -> &str {
            "fake"
        }

        async fn now_playing(&self, page: u32) -> Result<MovieListResponse, FetchError> {
            self.lookup("", page)
        }

        async fn search(&self, query: &str, page: u32) -> Result<MovieListResponse, FetchError> {
            self.lookup(query, page)
        }

        async fn movie_details(&self, movie_id: MovieId) -> Result<MovieRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.details
                .lock()
                .unwrap()
                .get(&movie_id)
                .cloned()
                .unwrap_or(Err(FetchError::NotFound(movie_id)))
        }
    }

    pub(crate) fn repository(source: FakeSource) -> (MovieRepository, Arc<FakeSource>) {
        let source = Arc::new(source);
        let store = WatchlistStore::open_in_memory().unwrap();
        (MovieRepository::new(source.clone(), store), source)
    }

    #[tokio::test]
    async fn test_now_playing_page_maps_records() {
        let source = FakeSource::default();
        source.listing("", 1, vec![record(1, "Dune"), record(2, "Arrival")], 3);
        let (repo, _) = repository(source);

        let page = repo.get_now_playing_page(1).await.unwrap();
        assert_eq!(page.page_number, 1);
        assert!(page.has_next);
        assert_eq!(page.items[0].title, "Dune");
        assert_eq!(page.items[1].poster_path.as_deref(), Some("/2.jpg"));
    }

    #[tokio::test]
    async fn test_blank_search_skips_remote() {
        let (repo, source) = repository(FakeSource::default());
        let page = repo.search_movies("   ", 1).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_uses_trimmed_query() {
        let source = FakeSource::default();
        source.listing("alien", 1, vec![record(348, "Alien")], 1);
        let (repo, _) = repository(source);

        let page = repo.search_movies("  alien ", 1).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_details_errors_propagate_in_kind() {
        let source = FakeSource::default();
        source
            .details
            .lock()
            .unwrap()
            .insert(5, Err(FetchError::Transient("timed out".to_string())));
        source.details.lock().unwrap().insert(6, Ok(record(6, "Heat")));
        let (repo, _) = repository(source);

        assert_eq!(repo.fetch_movie_details(999).await.unwrap_err(), FetchError::NotFound(999));
        assert!(repo.fetch_movie_details(5).await.unwrap_err().is_retryable());
        assert_eq!(repo.fetch_movie_details(6).await.unwrap().title, "Heat");
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (repo, _) = repository(FakeSource::default());
        let movie = Movie::new(1, "Dune");

        repo.add_to_watchlist(&movie).await.unwrap();
        repo.add_to_watchlist(&movie).await.unwrap();
        assert!(repo.is_in_watchlist(1).await.unwrap());
        assert_eq!(repo.watchlist_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let (repo, _) = repository(FakeSource::default());
        repo.remove_from_watchlist(&Movie::new(42, "Nothing")).await.unwrap();
        assert!(!repo.remove_by_id(42).await.unwrap());
        assert!(repo.watchlist_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_watchlist_entry_reads_stored_copy() {
        let (repo, _) = repository(FakeSource::default());
        assert!(repo.watchlist_entry(7).await.unwrap().is_none());

        repo.add_to_watchlist(&Movie::new(7, "Se7en")).await.unwrap();
        assert_eq!(repo.watchlist_entry(7).await.unwrap().unwrap().title, "Se7en");
    }

    #[tokio::test]
    async fn test_watchlist_works_over_offline_source() {
        let store = WatchlistStore::open_in_memory().unwrap();
        let repo = MovieRepository::new(Arc::new(marquee_sources::OfflineSource), store);

        repo.add_to_watchlist(&Movie::new(3, "Heat")).await.unwrap();
        assert!(repo.remove_by_id(3).await.unwrap());
        assert!(repo.watchlist_snapshot().is_empty());
        assert!(!repo.get_now_playing_page(1).await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_independent_subscribers_see_changes() {
        let (repo, _) = repository(FakeSource::default());
        let mut first = repo.get_watchlist();
        let mut second = repo.get_watchlist();

        assert!(first.next().await.unwrap().is_empty());
        assert!(second.next().await.unwrap().is_empty());

        repo.add_to_watchlist(&Movie::new(9, "Nine")).await.unwrap();
        assert!(first.next().await.unwrap().contains(9));
        assert!(second.next().await.unwrap().contains(9));

        // Late subscriber starts from current contents
        let mut late = repo.get_watchlist();
        assert_eq!(late.next().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_paging_through_repository() {
        let source = FakeSource::default();
        source.listing("", 1, (1..21).map(|id| record(id, "m")).collect(), 2);
        source.listing("", 2, (21..26).map(|id| record(id, "m")).collect(), 2);
        let (repo, source) = repository(source);

        let session = repo.paging(PagingConfig::default()).session(ListingContext::NowPlaying);
        session.next_page().await.unwrap();
        session.next_page().await.unwrap();
        let last = session.next_page().await.unwrap();

        assert!(last.is_empty());
        assert_eq!(session.window().len(), 25);
        assert_eq!(source.calls(), 2);
    }
}
