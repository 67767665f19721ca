use clap::ValueEnum;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use marquee_core::ListedMovie;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "✓".green(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "success",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Errors should always be shown, even in quiet mode
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", "✗".red(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "error",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{}", msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "info",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "⚠".yellow(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "warning",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{}", msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "info",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }
}

const WATCHLIST_MARK: &str = "★";
const OVERVIEW_WIDTH: usize = 60;

/// Cut `text` to at most `max` characters, ending with an ellipsis when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn year_cell(listed: &ListedMovie) -> String {
    match (listed.movie.release_year(), &listed.movie.release_date) {
        (Some(year), _) => year.to_string(),
        (None, Some(raw)) => raw.clone(),
        (None, None) => "-".to_string(),
    }
}

impl Output {
    /// Render a listing. Watchlisted movies carry a star.
    pub fn movie_table(&self, heading: &str, movies: &[ListedMovie], has_more: bool) {
        match self.format {
            OutputFormat::Human => {
                if self.quiet {
                    return;
                }
                if movies.is_empty() {
                    println!("{} {}", heading.bright_cyan().bold(), "(no movies)".dimmed());
                    return;
                }

                let mut table = Table::new();
                table
                    .load_preset(presets::UTF8_FULL)
                    .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![
                        Cell::new(""),
                        Cell::new("ID").add_attribute(Attribute::Bold),
                        Cell::new("Title").add_attribute(Attribute::Bold),
                        Cell::new("Year").add_attribute(Attribute::Bold),
                        Cell::new("Overview").add_attribute(Attribute::Bold),
                    ]);
                for listed in movies {
                    let mark = if listed.in_watchlist {
                        Cell::new(WATCHLIST_MARK).fg(Color::Yellow)
                    } else {
                        Cell::new("")
                    };
                    table.add_row(vec![
                        mark,
                        Cell::new(listed.movie.id),
                        Cell::new(&listed.movie.title),
                        Cell::new(year_cell(listed)),
                        Cell::new(truncate(&listed.movie.overview, OVERVIEW_WIDTH)),
                    ]);
                }

                println!("{} ({})", heading.bright_cyan().bold(), movies.len());
                println!("{}", table);
                if has_more {
                    println!("{}", "More results available (use --pages to load more)".dimmed());
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.json(&json!({
                    "type": "movies",
                    "heading": heading,
                    "count": movies.len(),
                    "has_more": has_more,
                    "movies": movies,
                }));
            }
        }
    }

    pub fn movie_detail(&self, listed: &ListedMovie, poster_url: Option<String>) {
        match self.format {
            OutputFormat::Human => {
                if self.quiet {
                    return;
                }
                let movie = &listed.movie;
                let mut table = Table::new();
                table.load_preset(presets::UTF8_FULL);
                table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
                table.set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec![
                    Cell::new(&movie.title).fg(Color::Cyan).add_attribute(Attribute::Bold),
                    Cell::new(if listed.in_watchlist { "On watchlist ★" } else { "" }).fg(Color::Yellow),
                ]);
                table.add_row(vec![Cell::new("ID"), Cell::new(movie.id)]);
                table.add_row(vec![
                    Cell::new("Released"),
                    Cell::new(movie.release_date.as_deref().unwrap_or("-")),
                ]);
                table.add_row(vec![
                    Cell::new("Poster"),
                    Cell::new(poster_url.as_deref().unwrap_or("-")),
                ]);
                table.add_row(vec![Cell::new("Overview"), Cell::new(&movie.overview)]);
                println!("{}", table);
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.json(&json!({
                    "type": "movie",
                    "movie": listed,
                    "poster_url": poster_url,
                }));
            }
        }
    }
}
