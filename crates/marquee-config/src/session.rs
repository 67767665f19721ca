use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

/// Persisted session token. Presence of a token means "logged in".
pub struct SessionStore {
    path: PathBuf,
    token: Option<String>,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, token: None }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let data: SessionData = toml::from_str(&content)?;
            self.token = data.auth_token.filter(|t| !t.is_empty());
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn save_token(&mut self, token: String) -> Result<()> {
        if token.trim().is_empty() {
            return Err(anyhow::anyhow!("Session token cannot be empty"));
        }
        self.token = Some(token);
        self.save()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = SessionData { auth_token: self.token.clone() };
        let content = toml::to_string_pretty(&data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
