use crate::error::CoreResult;
use crate::repository::MovieRepository;
use marquee_models::{Movie, MovieId};
use tracing::info;

/// How to reverse one watchlist change
#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistUndo {
    /// The movie was newly added; undo removes it
    Remove(MovieId),
    /// The row was replaced or deleted; undo puts this copy back
    Restore(Movie),
    /// The change did nothing
    Nothing,
}

impl MovieRepository {
    pub async fn add_to_watchlist_undoable(&self, movie: &Movie) -> CoreResult<WatchlistUndo> {
        let previous = self.store().get(movie.id).await?;
        self.add_to_watchlist(movie).await?;
        Ok(match previous {
            Some(previous) => WatchlistUndo::Restore(previous),
            None => WatchlistUndo::Remove(movie.id),
        })
    }

    pub async fn remove_from_watchlist_undoable(&self, movie: &Movie) -> CoreResult<WatchlistUndo> {
        let previous = self.store().get(movie.id).await?;
        self.remove_from_watchlist(movie).await?;
        Ok(previous.map_or(WatchlistUndo::Nothing, WatchlistUndo::Restore))
    }

    pub async fn undo(&self, change: WatchlistUndo) -> CoreResult<()> {
        match change {
            WatchlistUndo::Remove(id) => {
                self.remove_by_id(id).await?;
            }
            WatchlistUndo::Restore(movie) => {
                self.store().upsert(movie.clone()).await?;
                info!("Restored {} ({}) on watchlist", movie.title, movie.id);
            }
            WatchlistUndo::Nothing => {}
        }
        Ok(())
    }
}
