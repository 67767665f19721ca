use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner shown while pages load.
///
/// Off a terminal it stays hidden and progress goes to the log instead.
pub struct LoadingUI {
    spinner: ProgressBar,
    interactive: bool,
}

impl LoadingUI {
    pub fn new(message: impl Into<String>, quiet: bool) -> Self {
        let interactive = !quiet && is_interactive();
        let message = message.into();

        let spinner = if interactive {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
            {
                spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
            }
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner.set_message(message);
            spinner
        } else {
            tracing::info!(operation = "loading", message = %message, "Loading");
            ProgressBar::hidden()
        };

        Self { spinner, interactive }
    }

    pub fn page_loaded(&self, page: u32, total_items: usize) {
        if self.interactive {
            self.spinner.set_message(format!("Loaded page {} ({} movies)", page, total_items));
        } else {
            tracing::info!(operation = "page_loaded", page = page, items = total_items, "Page loaded");
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for LoadingUI {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
