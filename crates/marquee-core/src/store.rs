use crate::error::StoreError;
use chrono::{SecondsFormat, Utc};
use marquee_models::{Movie, MovieId};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

/// Immutable view of the whole watchlist at one commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistSnapshot {
    movies: Vec<Movie>,
    ids: HashSet<MovieId>,
}

impl WatchlistSnapshot {
    pub fn new(movies: Vec<Movie>) -> Self {
        let ids = movies.iter().map(|m| m.id).collect();
        Self { movies, ids }
    }

    /// Movies in the order they were first added
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn ids(&self) -> &HashSet<MovieId> {
        &self.ids
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// SQLite-backed watchlist table with a live query.
///
/// Every committed change publishes a fresh `WatchlistSnapshot` on a watch
/// channel; subscribers always see the latest contents without re-querying.
#[derive(Clone)]
pub struct WatchlistStore {
    conn: Arc<Mutex<Connection>>,
    changes: Arc<watch::Sender<Arc<WatchlistSnapshot>>>,
}

fn row_to_movie(row: &rusqlite::Row) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        overview: row.get(2)?,
        poster_path: row.get(3)?,
        release_date: row.get(4)?,
    })
}

fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS watchlist (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            overview TEXT NOT NULL DEFAULT '',
            poster_path TEXT,
            release_date TEXT,
            added_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_watchlist_added_at ON watchlist(added_at);",
    )?;
    Ok(())
}

fn query_all(conn: &Connection) -> Result<Vec<Movie>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, title, overview, poster_path, release_date
         FROM watchlist ORDER BY added_at ASC, id ASC",
    )?;
    let movies = stmt
        .query_map([], row_to_movie)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(movies)
}

impl WatchlistStore {
    /// Open (or create) the watchlist database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        info!("Opened watchlist database at {:?}", path);
        Self::from_connection(conn)
    }

    /// In-memory store; contents are lost when the last clone is dropped
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        run_migrations(&conn)?;
        let initial = WatchlistSnapshot::new(query_all(&conn)?);
        debug!("Watchlist store loaded with {} entries", initial.len());
        let (sender, _) = watch::channel(Arc::new(initial));
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes: Arc::new(sender),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// The connection lock is held for the whole closure, so writes and the
    /// snapshot they publish are serialized in commit order.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &watch::Sender<Arc<WatchlistSnapshot>>) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let changes = Arc::clone(&self.changes);
        tokio::task::spawn_blocking(move || {
            let guard: MutexGuard<'_, Connection> = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard, &changes)
        })
        .await?
    }

    fn publish(conn: &Connection, changes: &watch::Sender<Arc<WatchlistSnapshot>>) -> Result<(), StoreError> {
        let snapshot = WatchlistSnapshot::new(query_all(conn)?);
        debug!("Publishing watchlist snapshot ({} entries)", snapshot.len());
        changes.send_replace(Arc::new(snapshot));
        Ok(())
    }

    /// Insert or replace by id. The original `added_at` is kept on replace.
    pub async fn upsert(&self, movie: Movie) -> Result<(), StoreError> {
        self.with_conn(move |conn, changes| {
            let added_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
            conn.execute(
                "INSERT INTO watchlist (id, title, overview, poster_path, release_date, added_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    overview = excluded.overview,
                    poster_path = excluded.poster_path,
                    release_date = excluded.release_date",
                params![
                    movie.id,
                    movie.title,
                    movie.overview,
                    movie.poster_path,
                    movie.release_date,
                    added_at,
                ],
            )?;
            debug!("Watchlist upsert: {} ({})", movie.id, movie.title);
            Self::publish(conn, changes)
        })
        .await
    }

    /// Delete by id. Returns whether a row was removed; absent ids are not an error.
    pub async fn delete(&self, id: MovieId) -> Result<bool, StoreError> {
        self.with_conn(move |conn, changes| {
            let removed = conn.execute("DELETE FROM watchlist WHERE id = ?1", params![id])?;
            if removed == 0 {
                debug!("Watchlist delete: {} was not present", id);
                return Ok(false);
            }
            debug!("Watchlist delete: {}", id);
            Self::publish(conn, changes)?;
            Ok(true)
        })
        .await
    }

    pub async fn exists(&self, id: MovieId) -> Result<bool, StoreError> {
        self.with_conn(move |conn, _| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM watchlist WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    pub async fn get(&self, id: MovieId) -> Result<Option<Movie>, StoreError> {
        self.with_conn(move |conn, _| {
            let movie = conn
                .query_row(
                    "SELECT id, title, overview, poster_path, release_date FROM watchlist WHERE id = ?1",
                    params![id],
                    row_to_movie,
                )
                .optional()?;
            Ok(movie)
        })
        .await
    }

    /// Point-in-time read of every row, straight from the table
    pub async fn all(&self) -> Result<Vec<Movie>, StoreError> {
        self.with_conn(|conn, _| Ok(query_all(conn)?)).await
    }

    /// Remove every entry (app data wipe)
    pub async fn clear(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn, changes| {
            let removed = conn.execute("DELETE FROM watchlist", [])?;
            if removed > 0 {
                info!("Cleared {} watchlist entries", removed);
                Self::publish(conn, changes)?;
            }
            Ok(removed)
        })
        .await
    }

    /// Independent subscription to the live watchlist; starts at the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<WatchlistSnapshot>> {
        self.changes.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<WatchlistSnapshot> {
        self.changes.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            overview: format!("{} overview", title),
            poster_path: Some(format!("/{}.jpg", id)),
            release_date: Some("2024-03-01".to_string()),
            ..Movie::new(id, title)
        }
    }

    #[tokio::test]
    async fn test_upsert_exists_delete() {
        let store = WatchlistStore::open_in_memory().unwrap();
        assert!(!store.exists(1).await.unwrap());

        store.upsert(movie(1, "Dune")).await.unwrap();
        assert!(store.exists(1).await.unwrap());
        assert_eq!(store.get(1).await.unwrap(), Some(movie(1, "Dune")));

        assert!(store.delete(1).await.unwrap());
        assert!(!store.exists(1).await.unwrap());
        assert_eq!(store.get(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = WatchlistStore::open_in_memory().unwrap();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert!(!store.delete(99).await.unwrap());
        // Nothing changed, so nothing was published
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_upsert_replaces_snapshot_without_duplicating() {
        let store = WatchlistStore::open_in_memory().unwrap();
        store.upsert(movie(1, "Dune")).await.unwrap();
        store.upsert(movie(2, "Arrival")).await.unwrap();

        let mut updated = movie(1, "Dune: Part One");
        updated.overview = "new overview".to_string();
        store.upsert(updated.clone()).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Re-adding keeps the original position
        assert_eq!(all[0], updated);
        assert_eq!(all[1].id, 2);
    }

    #[tokio::test]
    async fn test_snapshot_published_after_each_commit() {
        let store = WatchlistStore::open_in_memory().unwrap();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        store.upsert(movie(7, "Seven")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.contains(7));
        assert_eq!(snapshot.len(), 1);

        store.delete(7).await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("watchlist.db");

        {
            let store = WatchlistStore::open(&path).unwrap();
            store.upsert(movie(1, "Dune")).await.unwrap();
            store.upsert(movie(2, "Arrival")).await.unwrap();
        }

        let reopened = WatchlistStore::open(&path).unwrap();
        let snapshot = reopened.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(1) && snapshot.contains(2));
        assert_eq!(snapshot.movies()[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_clear() {
        let store = WatchlistStore::open_in_memory().unwrap();
        store.upsert(movie(1, "Dune")).await.unwrap();
        store.upsert(movie(2, "Arrival")).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.snapshot().is_empty());
        assert_eq!(store.clear().await.unwrap(), 0);
    }
}
