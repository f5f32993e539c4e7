//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Credential file name under the base directory.
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client files (~/.petmily)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.petmily`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".petmily"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.petmily).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.petmily/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the durable credential file path (~/.petmily/credentials.json).
    pub fn credentials_file(&self) -> PathBuf {
        self.base_dir.join(CREDENTIALS_FILE_NAME)
    }

    /// Get the logs directory (~/.petmily/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().expect("Failed to determine home directory")
    }
}
