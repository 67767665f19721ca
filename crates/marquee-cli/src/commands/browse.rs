use super::app::App;
use super::loading_ui::LoadingUI;
use crate::output::Output;
use color_eyre::Result;
use marquee_core::{CoreError, ListedMovie, MovieRepository};
use marquee_models::{ListingContext, MovieId};
use marquee_sources::FetchError;

/// User-facing message for a failed remote call
pub fn describe_fetch_error(err: &FetchError) -> String {
    match err {
        FetchError::NotFound(id) => format!("No movie with id {}", id),
        FetchError::Transient(_) => format!(
            "{} (the network looks unreachable or the service is busy, try again)",
            err
        ),
        FetchError::Permanent { .. } => err.to_string(),
    }
}

fn describe(err: &CoreError) -> String {
    match err.fetch_error() {
        Some(fetch) => describe_fetch_error(fetch),
        None => err.to_string(),
    }
}

pub async fn run_now_playing(pages: u32, output: &Output) -> Result<()> {
    let app = App::load()?;
    let repo = app.repository()?;
    list_context(&app, &repo, ListingContext::NowPlaying, "Now playing", pages, output).await
}

pub async fn run_search(query: &str, pages: u32, output: &Output) -> Result<()> {
    let context = ListingContext::search(query);
    if context.query().map_or(true, str::is_empty) {
        output.warn("Search text is empty");
        return Ok(());
    }
    let app = App::load()?;
    let repo = app.repository()?;
    let heading = format!("Results for \"{}\"", query.trim());
    list_context(&app, &repo, context, &heading, pages, output).await
}

/// Load up to `pages` pages of one listing and print them with watchlist marks
async fn list_context(
    app: &App,
    repo: &MovieRepository,
    context: ListingContext,
    heading: &str,
    pages: u32,
    output: &Output,
) -> Result<()> {
    let provider = repo.paging(app.config.paging.clone());
    let session = provider.session(context.clone());
    let ui = LoadingUI::new(format!("Loading {}...", heading.to_lowercase()), output.is_quiet());

    for _ in 0..pages.max(1) {
        match session.next_page().await {
            Ok(page) => {
                ui.page_loaded(page.page_number, session.window().len());
                if !page.has_next {
                    break;
                }
            }
            Err(e) => {
                ui.finish();
                let message = describe(&e);
                if session.loaded_pages() == 0 {
                    output.error(&message);
                    return Err(color_eyre::eyre::eyre!("Failed to load {}", context));
                }
                // Show what did load
                output.warn(format!("Stopped early: {}", message));
                break;
            }
        }
    }
    ui.finish();

    let listed: Vec<ListedMovie> = repo.membership().annotate(&session.window());
    output.movie_table(heading, &listed, session.has_more());
    session.dispose();
    Ok(())
}

pub async fn run_details(id: MovieId, output: &Output) -> Result<()> {
    let app = App::load()?;
    let repo = app.repository()?;

    let ui = LoadingUI::new(format!("Fetching movie {}...", id), output.is_quiet());
    let result = repo.fetch_movie_details(id).await;
    ui.finish();

    let movie = match result {
        Ok(movie) => movie,
        Err(e) => {
            output.error(describe_fetch_error(&e));
            return Err(color_eyre::eyre::eyre!("Failed to fetch movie {}", id));
        }
    };

    let poster_url = movie.poster_url(&app.config.api.image_base_url);
    let listed = ListedMovie {
        in_watchlist: repo.membership().contains(movie.id),
        movie,
    };
    output.movie_detail(&listed, poster_url);
    Ok(())
}
