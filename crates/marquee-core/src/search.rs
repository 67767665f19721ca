use crate::error::CoreResult;
use crate::paging::{PagingProvider, PagingSession};
use marquee_config::SearchConfig;
use marquee_models::{ListingContext, Page};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// First page for the settled query
    Results { context: ListingContext, page: Page },
    /// Blank input; any previous search was dropped
    Cleared,
    /// A newer query arrived before this one settled
    Superseded,
}

/// Search-as-you-type front end over the paging provider.
///
/// Each `submit` waits out the debounce delay; a newer submit cancels any
/// older one still waiting or loading, so only the latest query reaches the
/// remote. Settled queries keep their paging context, so resubmitting the
/// same text is served from cache.
pub struct DebouncedSearch {
    paging: PagingProvider,
    delay: Duration,
    generation: AtomicU64,
    pending: Mutex<Option<CancellationToken>>,
    current: Mutex<Option<ListingContext>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DebouncedSearch {
    pub fn new(paging: PagingProvider, delay: Duration) -> Self {
        Self {
            paging,
            delay,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    pub fn from_config(paging: PagingProvider, config: &SearchConfig) -> Self {
        Self::new(paging, Duration::from_millis(config.debounce_ms))
    }

    pub async fn submit(&self, query: &str) -> CoreResult<SearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.pending).replace(token.clone()) {
            previous.cancel();
        }

        let context = ListingContext::search(query);
        if context.query().map_or(true, str::is_empty) {
            self.switch_to(None);
            return Ok(SearchOutcome::Cleared);
        }

        tokio::select! {
            _ = token.cancelled() => {
                debug!("Search for {} superseded while debouncing", context);
                return Ok(SearchOutcome::Superseded);
            }
            _ = tokio::time::sleep(self.delay) => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!("Search for {} superseded while loading", context);
                self.abandon(&context);
                return Ok(SearchOutcome::Superseded);
            }
            result = self.paging.load_page(&context, 1) => result,
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            self.abandon(&context);
            return Ok(SearchOutcome::Superseded);
        }
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.abandon(&context);
                return Err(e);
            }
        };
        self.switch_to(Some(context.clone()));
        Ok(SearchOutcome::Results { context, page })
    }

    /// Session for paging further into the current results
    pub fn session(&self) -> Option<PagingSession> {
        lock(&self.current)
            .clone()
            .map(|context| self.paging.session(context))
    }

    pub fn current(&self) -> Option<ListingContext> {
        lock(&self.current).clone()
    }

    /// Cancel whatever submit is still pending
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.pending).take() {
            token.cancel();
        }
    }

    /// Drop the paging context of a query that never became current
    fn abandon(&self, context: &ListingContext) {
        if lock(&self.current).as_ref() != Some(context) {
            self.paging.release(context);
        }
    }

    fn switch_to(&self, context: Option<ListingContext>) {
        let previous = std::mem::replace(&mut *lock(&self.current), context.clone());
        if let Some(previous) = previous {
            if Some(&previous) != context.as_ref() {
                debug!("Releasing previous search {}", previous);
                self.paging.release(&previous);
            }
        }
    }
}
