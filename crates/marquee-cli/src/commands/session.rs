use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::SessionCommands;
use color_eyre::Result;
use marquee_config::{PathManager, SessionStore};
use serde_json::json;

pub fn run_session(cmd: SessionCommands, output: &Output) -> Result<()> {
    let session_file = PathManager::default().session_file();
    let mut store = SessionStore::new(session_file.clone());
    store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load session from {}: {}", session_file.display(), e))?;

    match cmd {
        SessionCommands::Status => {
            match output.format() {
                OutputFormat::Human => {
                    if store.is_logged_in() {
                        output.success("Logged in");
                    } else {
                        output.warn("Not logged in. Run 'marquee session set' to store a token.");
                    }
                }
                OutputFormat::Json | OutputFormat::JsonPretty => {
                    output.json(&json!({
                        "type": "session",
                        "logged_in": store.is_logged_in(),
                        "session_file": session_file.display().to_string(),
                    }));
                }
            }
            Ok(())
        }
        SessionCommands::Set { token } => {
            let token = match token {
                Some(token) => token,
                None => prompts::prompt_secret("Session token")?,
            };
            store
                .save_token(token.trim().to_string())
                .map_err(|e| color_eyre::eyre::eyre!("Failed to save session: {}", e))?;
            output.success(format!("Session token saved to {}", session_file.display()));
            Ok(())
        }
        SessionCommands::Clear => {
            let was_logged_in = store.is_logged_in();
            store
                .clear()
                .map_err(|e| color_eyre::eyre::eyre!("Failed to clear session: {}", e))?;
            if was_logged_in {
                output.success("Session cleared");
            } else {
                output.info("No session to clear");
            }
            Ok(())
        }
    }
}
