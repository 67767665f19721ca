use super::app::App;
use super::browse::describe_fetch_error;
use super::prompts;
use crate::output::Output;
use crate::WatchlistCommands;
use color_eyre::Result;
use marquee_core::annotate;
use marquee_models::MovieId;

pub async fn run_watchlist(cmd: WatchlistCommands, output: &Output) -> Result<()> {
    let app = App::load()?;
    match cmd {
        WatchlistCommands::List => list(&app, output),
        WatchlistCommands::Add { id } => add(&app, id, output).await,
        WatchlistCommands::Remove { id, yes } => remove(&app, id, yes, output).await,
    }
}

fn list(app: &App, output: &Output) -> Result<()> {
    let snapshot = app.watchlist_repository().watchlist_snapshot();
    let listed = annotate(snapshot.movies(), &snapshot);
    output.movie_table("Watchlist", &listed, false);
    Ok(())
}

async fn add(app: &App, id: MovieId, output: &Output) -> Result<()> {
    let repo = app.repository()?;
    let movie = match repo.fetch_movie_details(id).await {
        Ok(movie) => movie,
        Err(e) => {
            output.error(describe_fetch_error(&e));
            return Err(color_eyre::eyre::eyre!("Could not add movie {}", id));
        }
    };

    let already = repo.is_in_watchlist(id).await?;
    repo.add_to_watchlist(&movie).await?;
    if already {
        output.info(format!("{} is already on your watchlist (details refreshed)", movie.title));
    } else {
        output.success(format!("Added {} to your watchlist", movie.title));
    }
    Ok(())
}

async fn remove(app: &App, id: MovieId, yes: bool, output: &Output) -> Result<()> {
    // Removal works offline
    let repo = app.watchlist_repository();
    let Some(movie) = repo.watchlist_entry(id).await? else {
        output.info(format!("Movie {} is not on your watchlist", id));
        return Ok(());
    };

    if !yes {
        let confirmed = prompts::prompt_yes_no(&format!("Remove {} from your watchlist?", movie.title), false)?;
        if !confirmed {
            output.info("Nothing removed");
            return Ok(());
        }
    }

    repo.remove_from_watchlist(&movie).await?;
    output.success(format!("Removed {} from your watchlist", movie.title));
    Ok(())
}
