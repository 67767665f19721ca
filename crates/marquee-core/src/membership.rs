use crate::store::WatchlistSnapshot;
use futures::Stream;
use marquee_models::{Movie, MovieId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// A listed movie plus whether it is currently on the watchlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub in_watchlist: bool,
}

/// Merge a movie list with a watchlist snapshot. Lookup is O(1) per movie.
pub fn annotate(movies: &[Movie], watchlist: &WatchlistSnapshot) -> Vec<ListedMovie> {
    movies
        .iter()
        .map(|movie| ListedMovie {
            movie: movie.clone(),
            in_watchlist: watchlist.contains(movie.id),
        })
        .collect()
}

/// Read side of the live watchlist, for marking listings
#[derive(Clone)]
pub struct WatchlistMembership {
    rx: watch::Receiver<Arc<WatchlistSnapshot>>,
}

impl WatchlistMembership {
    pub fn new(rx: watch::Receiver<Arc<WatchlistSnapshot>>) -> Self {
        Self { rx }
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.rx.borrow().contains(id)
    }

    pub fn snapshot(&self) -> Arc<WatchlistSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn annotate(&self, movies: &[Movie]) -> Vec<ListedMovie> {
        annotate(movies, &self.snapshot())
    }

    /// Annotated list that is recomputed whenever either the movie list or
    /// the watchlist changes. Ends when either side is dropped.
    pub fn annotated_updates(
        &self,
        movies: watch::Receiver<Arc<Vec<Movie>>>,
    ) -> impl Stream<Item = Vec<ListedMovie>> {
        let watchlist = self.rx.clone();
        futures::stream::unfold((movies, watchlist, true), |(mut movies, mut watchlist, first)| async move {
            if !first {
                tokio::select! {
                    changed = movies.changed() => {
                        if changed.is_err() {
                            return None;
                        }
                    }
                    changed = watchlist.changed() => {
                        if changed.is_err() {
                            return None;
                        }
                    }
                }
            }
            let items = {
                let listed = movies.borrow_and_update().clone();
                let snapshot = watchlist.borrow_and_update().clone();
                annotate(&listed, &snapshot)
            };
            Some((items, (movies, watchlist, false)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WatchlistStore;
    use futures::StreamExt;

    #[test]
    fn test_annotate_marks_members() {
        let snapshot = WatchlistSnapshot::new(vec![Movie::new(2, "B")]);
        let listed = annotate(&[Movie::new(1, "A"), Movie::new(2, "B")], &snapshot);
        assert!(!listed[0].in_watchlist);
        assert!(listed[1].in_watchlist);
    }

    #[test]
    fn test_listed_movie_serializes_flat() {
        let listed = ListedMovie {
            movie: Movie::new(3, "C"),
            in_watchlist: true,
        };
        let value = serde_json::to_value(&listed).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["in_watchlist"], true);
    }

    #[tokio::test]
    async fn test_membership_follows_store() {
        let store = WatchlistStore::open_in_memory().unwrap();
        let membership = WatchlistMembership::new(store.subscribe());
        assert!(!membership.contains(1));

        store.upsert(Movie::new(1, "A")).await.unwrap();
        assert!(membership.contains(1));

        store.delete(1).await.unwrap();
        assert!(!membership.contains(1));
    }

    #[tokio::test]
    async fn test_annotated_updates_on_either_change() {
        let store = WatchlistStore::open_in_memory().unwrap();
        let membership = WatchlistMembership::new(store.subscribe());
        let (movies_tx, movies_rx) = watch::channel(Arc::new(vec![Movie::new(1, "A")]));

        let mut updates = Box::pin(membership.annotated_updates(movies_rx));
        let initial = updates.next().await.unwrap();
        assert_eq!(initial.len(), 1);
        assert!(!initial[0].in_watchlist);

        store.upsert(Movie::new(1, "A")).await.unwrap();
        let after_add = updates.next().await.unwrap();
        assert!(after_add[0].in_watchlist);

        movies_tx.send_replace(Arc::new(vec![Movie::new(1, "A"), Movie::new(2, "B")]));
        let after_page = updates.next().await.unwrap();
        assert_eq!(after_page.len(), 2);
        assert!(after_page[0].in_watchlist);
        assert!(!after_page[1].in_watchlist);

        drop(movies_tx);
        assert!(updates.next().await.is_none());
    }
}
