use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use marquee_config::PagingConfig;
use marquee_models::{ListingContext, Movie, MovieId, Page};
use marquee_sources::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where pages come from. Implemented by `MovieRepository`.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load_page(&self, context: &ListingContext, page: u32) -> Result<Page, FetchError>;
}

/// Ordered, id-deduplicated concatenation of the pages loaded for one context.
///
/// The first occurrence of an id wins; a later duplicate is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagingWindow {
    items: Vec<Movie>,
    seen: HashSet<MovieId>,
}

impl PagingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page, returning how many of its items were new
    pub fn append(&mut self, page: &Page) -> usize {
        let before = self.items.len();
        for movie in &page.items {
            if self.seen.insert(movie.id) {
                self.items.push(movie.clone());
            }
        }
        self.items.len() - before
    }

    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<Page, FetchError>>>;

struct InFlight {
    load_id: u64,
    page: u32,
    waiters: usize,
    future: SharedLoad,
}

struct ContextState {
    context: ListingContext,
    page_size: usize,
    window: PagingWindow,
    pages: Vec<Page>,
    exhausted: bool,
    in_flight: Option<InFlight>,
    // Bumped on every reset so loads started before it are never applied
    generation: u64,
    released: bool,
    window_tx: watch::Sender<Arc<Vec<Movie>>>,
}

impl ContextState {
    fn new(context: ListingContext, page_size: usize) -> Self {
        let (window_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            context,
            page_size,
            window: PagingWindow::new(),
            pages: Vec::new(),
            exhausted: false,
            in_flight: None,
            generation: 0,
            released: false,
            window_tx,
        }
    }

    fn loaded_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    fn apply(&mut self, page: &Page) {
        if page.len() > self.page_size {
            warn!(
                "{} page {} has {} items, more than the configured page size {}",
                self.context, page.page_number, page.len(), self.page_size
            );
        }
        let added = self.window.append(page);
        if added < page.len() {
            debug!(
                "{} page {}: dropped {} duplicate ids",
                self.context,
                page.page_number,
                page.len() - added
            );
        }
        self.pages.push(page.clone());
        self.exhausted = !page.has_next;
        self.publish();
        debug!(
            "{} page {} applied: window now {} items (has_next: {})",
            self.context,
            page.page_number,
            self.window.len(),
            page.has_next
        );
    }

    fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("{}: discarding in-flight load of page {}", self.context, in_flight.page);
        }
        self.generation += 1;
        self.window.clear();
        self.pages.clear();
        self.exhausted = false;
        self.publish();
    }

    fn publish(&self) {
        self.window_tx.send_replace(Arc::new(self.window.items().to_vec()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One caller's interest in an in-flight load.
///
/// Dropping it before completion withdraws that interest; when the last
/// waiter goes away the load is cancelled and the window is left untouched.
struct Waiter {
    state: Arc<Mutex<ContextState>>,
    load_id: u64,
    page: u32,
    generation: u64,
    done: bool,
}

impl Waiter {
    /// Record completion. Returns false if the load was discarded by a reset.
    fn finish(&mut self, result: &Result<Page, FetchError>) -> bool {
        self.done = true;
        let mut state = lock(&self.state);
        if state.generation != self.generation {
            return false;
        }
        let ours = state.in_flight.as_ref().map(|f| f.load_id) == Some(self.load_id);
        if ours {
            // First waiter to wake applies the result for everyone
            state.in_flight = None;
            if let Ok(page) = result {
                state.apply(page);
            }
        }
        true
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = lock(&self.state);
        let context = state.context.clone();
        let abandoned = match state.in_flight.as_mut() {
            Some(in_flight) if in_flight.load_id == self.load_id => {
                in_flight.waiters = in_flight.waiters.saturating_sub(1);
                in_flight.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            state.in_flight = None;
            debug!("{}: load of page {} cancelled by its callers", context, self.page);
        }
    }
}

struct ProviderInner {
    loader: Arc<dyn PageLoader>,
    config: Mutex<PagingConfig>,
    contexts: Mutex<HashMap<ListingContext, Arc<Mutex<ContextState>>>>,
    next_load_id: AtomicU64,
    disposed: AtomicBool,
}

/// Incremental, forward-only page loader with one cached window per context.
///
/// Loads for one context are serialized: while a load is in flight, a request
/// for the same page joins it and a request for a later page waits for it.
#[derive(Clone)]
pub struct PagingProvider {
    inner: Arc<ProviderInner>,
}

impl PagingProvider {
    pub fn new(loader: Arc<dyn PageLoader>, config: PagingConfig) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                loader,
                config: Mutex::new(config),
                contexts: Mutex::new(HashMap::new()),
                next_load_id: AtomicU64::new(1),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> PagingConfig {
        lock(&self.inner.config).clone()
    }

    /// Handle bound to one context
    pub fn session(&self, context: ListingContext) -> PagingSession {
        PagingSession {
            provider: self.clone(),
            context,
        }
    }

    fn ensure_active(&self) -> CoreResult<()> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(CoreError::Disposed);
        }
        Ok(())
    }

    fn context_state(&self, context: &ListingContext) -> CoreResult<Arc<Mutex<ContextState>>> {
        self.ensure_active()?;
        let page_size = lock(&self.inner.config).page_size;
        let mut contexts = lock(&self.inner.contexts);
        let state = contexts
            .entry(context.clone())
            .or_insert_with(|| {
                debug!("Opening paging context {}", context);
                Arc::new(Mutex::new(ContextState::new(context.clone(), page_size)))
            });
        Ok(Arc::clone(state))
    }

    fn existing_state(&self, context: &ListingContext) -> Option<Arc<Mutex<ContextState>>> {
        lock(&self.inner.contexts).get(context).cloned()
    }

    fn start_load(&self, context: ListingContext, page: u32) -> SharedLoad {
        let loader = Arc::clone(&self.inner.loader);
        async move { loader.load_page(&context, page).await }
            .boxed()
            .shared()
    }

    /// Load `page_number` (1-based) of `context`.
    ///
    /// Already-loaded pages come from the cache. Once the context is exhausted
    /// any further page is returned empty without a remote call. Skipping
    /// ahead of the next unloaded page is rejected.
    pub async fn load_page(&self, context: &ListingContext, page_number: u32) -> CoreResult<Page> {
        if page_number == 0 {
            return Err(CoreError::InvalidPage);
        }
        let state = self.context_state(context)?;

        loop {
            self.ensure_active()?;
            let (mut waiter, future) = {
                let mut guard = lock(&state);
                if guard.released {
                    return Err(CoreError::Cancelled(context.clone()));
                }
                let generation = guard.generation;

                if let Some(in_flight) = guard.in_flight.as_mut() {
                    in_flight.waiters += 1;
                    if in_flight.page == page_number {
                        debug!("{}: joining in-flight load of page {}", context, page_number);
                    } else {
                        debug!(
                            "{}: page {} waits for in-flight page {}",
                            context, page_number, in_flight.page
                        );
                    }
                    let waiter = Waiter {
                        state: Arc::clone(&state),
                        load_id: in_flight.load_id,
                        page: in_flight.page,
                        generation,
                        done: false,
                    };
                    (waiter, in_flight.future.clone())
                } else {
                    let loaded = guard.loaded_pages();
                    if page_number <= loaded {
                        return Ok(guard.pages[(page_number - 1) as usize].clone());
                    }
                    if guard.exhausted {
                        debug!("{}: exhausted after page {}, not fetching page {}", context, loaded, page_number);
                        return Ok(Page::empty(page_number));
                    }
                    if page_number != loaded + 1 {
                        return Err(CoreError::PageOutOfOrder {
                            context: context.clone(),
                            expected: loaded + 1,
                            requested: page_number,
                        });
                    }

                    let load_id = self.inner.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let future = self.start_load(context.clone(), page_number);
                    guard.in_flight = Some(InFlight {
                        load_id,
                        page: page_number,
                        waiters: 1,
                        future: future.clone(),
                    });
                    debug!("{}: loading page {}", context, page_number);
                    let waiter = Waiter {
                        state: Arc::clone(&state),
                        load_id,
                        page: page_number,
                        generation,
                        done: false,
                    };
                    (waiter, future)
                }
            };

            let result = future.await;
            let current = waiter.finish(&result);

            // A failed earlier page fails this request with the same kind
            if waiter.page == page_number || result.is_err() {
                if !current {
                    return Err(CoreError::Cancelled(context.clone()));
                }
                if let Err(e) = &result {
                    warn!("{}: page {} failed: {}", context, waiter.page, e);
                }
                return result.map_err(CoreError::from);
            }
            // We only waited for an earlier page; look again
        }
    }

    /// Load whatever page comes next for `context`
    pub async fn next_page(&self, context: &ListingContext) -> CoreResult<Page> {
        let next = {
            let state = self.context_state(context)?;
            let guard = lock(&state);
            match &guard.in_flight {
                Some(in_flight) => in_flight.page,
                None => guard.loaded_pages() + 1,
            }
        };
        self.load_page(context, next).await
    }

    /// Discard the window for `context` and load page 1 again
    pub async fn refresh(&self, context: &ListingContext) -> CoreResult<Page> {
        {
            let state = self.context_state(context)?;
            lock(&state).reset();
        }
        info!("Refreshing {}", context);
        self.load_page(context, 1).await
    }

    /// Snapshot of the accumulated window
    pub fn window(&self, context: &ListingContext) -> Vec<Movie> {
        self.existing_state(context)
            .map(|state| lock(&state).window.items().to_vec())
            .unwrap_or_default()
    }

    /// Live view of the window, updated after every applied page and reset
    pub fn subscribe_window(&self, context: &ListingContext) -> CoreResult<watch::Receiver<Arc<Vec<Movie>>>> {
        let state = self.context_state(context)?;
        let guard = lock(&state);
        Ok(guard.window_tx.subscribe())
    }

    pub fn loaded_pages(&self, context: &ListingContext) -> u32 {
        self.existing_state(context)
            .map(|state| lock(&state).loaded_pages())
            .unwrap_or(0)
    }

    /// False once a page without successors has been loaded
    pub fn has_more(&self, context: &ListingContext) -> bool {
        self.existing_state(context)
            .map(|state| !lock(&state).exhausted)
            .unwrap_or(true)
    }

    /// Whether a reader looking at `last_visible_index` is close enough to the
    /// end of the window that the next page should be requested
    pub fn should_load_more(&self, context: &ListingContext, last_visible_index: usize) -> bool {
        let prefetch_distance = lock(&self.inner.config).prefetch_distance;
        match self.existing_state(context) {
            None => true,
            Some(state) => {
                let guard = lock(&state);
                !guard.exhausted
                    && guard.in_flight.is_none()
                    && last_visible_index.saturating_add(prefetch_distance) >= guard.window.len()
            }
        }
    }

    /// Contexts currently holding a cached window or an in-flight load
    pub fn open_contexts(&self) -> Vec<ListingContext> {
        lock(&self.inner.contexts).keys().cloned().collect()
    }

    /// Drop one context's cache. In-flight loads for it resolve as cancelled.
    pub fn release(&self, context: &ListingContext) {
        let removed = lock(&self.inner.contexts).remove(context);
        if let Some(state) = removed {
            let mut guard = lock(&state);
            guard.reset();
            guard.released = true;
            debug!("Released paging context {}", context);
        }
    }

    /// Change paging parameters. A new page size resets every context.
    pub fn reconfigure(&self, config: PagingConfig) {
        let page_size_changed = {
            let mut current = lock(&self.inner.config);
            let changed = current.page_size != config.page_size;
            *current = config;
            changed
        };
        if page_size_changed {
            let states: Vec<_> = lock(&self.inner.contexts).drain().map(|(_, state)| state).collect();
            info!("Page size changed, resetting {} paging contexts", states.len());
            for state in states {
                let mut guard = lock(&state);
                guard.reset();
                guard.released = true;
            }
        }
    }

    /// Tear down every context; further calls fail with `CoreError::Disposed`
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let states: Vec<_> = lock(&self.inner.contexts).drain().map(|(_, state)| state).collect();
        for state in states {
            let mut guard = lock(&state);
            guard.reset();
            guard.released = true;
        }
        debug!("Paging provider disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

/// A view's handle on one paging context.
///
/// The cached window lives until `dispose` is called.
pub struct PagingSession {
    provider: PagingProvider,
    context: ListingContext,
}

impl PagingSession {
    pub fn context(&self) -> &ListingContext {
        &self.context
    }

    pub async fn load_page(&self, page_number: u32) -> CoreResult<Page> {
        self.provider.load_page(&self.context, page_number).await
    }

    pub async fn next_page(&self) -> CoreResult<Page> {
        self.provider.next_page(&self.context).await
    }

    pub async fn refresh(&self) -> CoreResult<Page> {
        self.provider.refresh(&self.context).await
    }

    pub fn window(&self) -> Vec<Movie> {
        self.provider.window(&self.context)
    }

    pub fn subscribe_window(&self) -> CoreResult<watch::Receiver<Arc<Vec<Movie>>>> {
        self.provider.subscribe_window(&self.context)
    }

    pub fn loaded_pages(&self) -> u32 {
        self.provider.loaded_pages(&self.context)
    }

    pub fn has_more(&self) -> bool {
        self.provider.has_more(&self.context)
    }

    pub fn should_load_more(&self, last_visible_index: usize) -> bool {
        self.provider.should_load_more(&self.context, last_visible_index)
    }

    pub fn dispose(self) {
        self.provider.release(&self.context);
    }
}
