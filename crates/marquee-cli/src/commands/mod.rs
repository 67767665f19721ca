pub mod app;
pub mod browse;
pub mod config;
pub mod loading_ui;
pub mod prompts;
pub mod session;
pub mod watchlist;
