use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

use fridge_core::openrouter::DEFAULT_MODEL;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_VAR: &str = "OPENROUTER_MODEL";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    /// `None` means receipt scanning runs in demo mode.
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
}

impl Config {
    /// Resolve paths and AI settings. `db_override` comes from `--db` or `FRIDGE_DB`.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "fridge").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = db_override.unwrap_or_else(|| data_dir.join("fridge.db"));
        debug!(db = %db_path.display(), "resolved database path");

        Ok(Config {
            db_path,
            data_dir,
            openrouter_api_key: env_non_empty(API_KEY_VAR),
            openrouter_model: env_non_empty(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
