use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use marquee_config::{Config, PathManager, API_TOKEN_ENV};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Init { token, region, force } => init_config(token, region, force, output),
    }
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'marquee config init' to create one. Defaults are used until then.");
    }

    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let token = config.api.resolved_token();
    let token_display = match &token {
        Some(token) if full => token.clone(),
        Some(token) => mask_string(token),
        None => "<not set>".to_string(),
    };
    let token_origin = if std::env::var(API_TOKEN_ENV).map_or(false, |t| !t.trim().is_empty()) {
        API_TOKEN_ENV
    } else {
        "config file"
    };
    let database_file = config
        .storage
        .database_file
        .clone()
        .unwrap_or_else(|| path_manager.database_file());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config file"), Cell::new(config_file.display())]);
            table.add_row(vec![Cell::new("API base URL"), Cell::new(&config.api.base_url)]);
            table.add_row(vec![Cell::new("Image base URL"), Cell::new(&config.api.image_base_url)]);
            table.add_row(vec![Cell::new("Region"), Cell::new(&config.api.region)]);
            table.add_row(vec![
                Cell::new("API token"),
                Cell::new(if token.is_some() {
                    format!("{} (from {})", token_display, token_origin)
                } else {
                    token_display.clone()
                }),
            ]);
            table.add_row(vec![Cell::new("Request timeout"), Cell::new(format!("{}s", config.api.timeout_seconds))]);
            table.add_row(vec![Cell::new("Page size"), Cell::new(config.paging.page_size)]);
            table.add_row(vec![Cell::new("Prefetch distance"), Cell::new(config.paging.prefetch_distance)]);
            table.add_row(vec![Cell::new("Search debounce"), Cell::new(format!("{}ms", config.search.debounce_ms))]);
            table.add_row(vec![Cell::new("Watchlist database"), Cell::new(database_file.display())]);
            println!("{}", table);

            if let Err(e) = config.validate() {
                output.warn(e.to_string());
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "type": "config",
                "config_file": config_file.display().to_string(),
                "api": {
                    "base_url": &config.api.base_url,
                    "image_base_url": &config.api.image_base_url,
                    "region": &config.api.region,
                    "access_token": token.as_ref().map(|_| token_display.clone()),
                    "timeout_seconds": config.api.timeout_seconds,
                },
                "paging": &config.paging,
                "search": &config.search,
                "database_file": database_file.display().to_string(),
                "valid": config.validate().is_ok(),
            }));
        }
    }

    Ok(())
}

fn init_config(token: Option<String>, region: Option<String>, force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if config_file.exists() && !force {
        output.warn(format!("Configuration already exists at {}", config_file.display()));
        output.info("Use --force to overwrite it.");
        return Ok(());
    }

    let mut config = Config::default();

    let token = match token {
        Some(token) => token,
        None if std::env::var(API_TOKEN_ENV).is_ok() => {
            output.info(format!("Using the API token from {} at runtime", API_TOKEN_ENV));
            String::new()
        }
        None => prompts::prompt_secret("TMDB API read access token")?,
    };
    if !token.trim().is_empty() {
        config.api.access_token = token.trim().to_string();
    }

    config.api.region = match region {
        Some(region) => region,
        None => prompts::prompt_string("Region", Some(config.api.region.as_str()))?,
    }
    .trim()
    .to_uppercase();

    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration written to {}", config_file.display()));
    if !config.is_api_configured() {
        output.warn(format!(
            "No API token stored. Set api.access_token or export {} before browsing.",
            API_TOKEN_ENV
        ));
    }
    Ok(())
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}
