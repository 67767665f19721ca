use clap::{ArgAction, Parser, Subcommand};
use commands::{browse, config, session, watchlist};
use marquee_config::PathManager;
use marquee_models::MovieId;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee - Browse what's playing and keep a watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to the daily-rotated log file instead of stderr
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_to_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List movies now playing in theatres
    #[command(long_about = "List movies now playing in the configured region. Movies already on your watchlist are marked.")]
    NowPlaying {
        /// Number of pages to load (20 movies per page)
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search movies by title
    Search {
        /// Search text
        query: String,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one movie
    Details {
        /// Remote movie id
        id: MovieId,
    },
    /// Manage the local watchlist
    #[command(long_about = "Manage the local watchlist. Running without a subcommand lists it.")]
    Watchlist {
        #[command(subcommand)]
        cmd: Option<WatchlistCommands>,
    },
    /// Manage the stored session token
    Session {
        #[command(subcommand)]
        cmd: SessionCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List watchlisted movies in the order they were added
    List,
    /// Look up a movie remotely and add it
    Add {
        id: MovieId,
    },
    /// Remove a movie
    Remove {
        id: MovieId,

        /// Skip the confirmation prompt
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show whether a session token is stored
    Status,
    /// Store a session token (prompts if omitted)
    Set {
        token: Option<String>,
    },
    /// Remove the stored token
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API token)
    Show {
        /// Show the API token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a config file with defaults
    Init {
        /// TMDB API read access token (prompts if omitted)
        #[arg(long)]
        token: Option<String>,

        /// Region for now-playing listings, e.g. CA or US
        #[arg(long)]
        region: Option<String>,

        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli.log_to_file.then(|| PathManager::default().log_file());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::NowPlaying { pages } => browse::run_now_playing(pages, &output).await,
        Commands::Search { query, pages } => browse::run_search(&query, pages, &output).await,
        Commands::Details { id } => browse::run_details(id, &output).await,
        Commands::Watchlist { cmd } => {
            let cmd = cmd.unwrap_or(WatchlistCommands::List);
            watchlist::run_watchlist(cmd, &output).await
        }
        Commands::Session { cmd } => session::run_session(cmd, &output),
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output)
        }
    }
}
