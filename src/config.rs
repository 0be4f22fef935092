//! Configuration for pldl.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--root`, `--config`)
//! 2. Environment variables (PLDL_HOME, YTDLP_PATH)
//! 3. Config file (`<root>/config.json`)
//! 4. Defaults
//!
//! Relative paths in the config file are resolved against the project root.
//! The resolved config is built once at startup and passed by reference.

pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Raw config file schema (matches `config.json`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub app: AppConfig,

    /// Options forwarded to yt-dlp
    #[serde(default)]
    pub ytdlp: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Catalog file (relative to the root)
    pub csv_file: Option<String>,
    /// Download directory (relative to the root, `~/` expanded)
    pub save_path: Option<String>,
    /// yt-dlp executable
    pub ytdlp_path: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Project root
    pub root: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Catalog CSV file
    pub csv_file: PathBuf,
    /// Directory downloads are saved under
    pub save_path: PathBuf,
    /// yt-dlp executable
    pub ytdlp_binary: String,
    /// Options forwarded to yt-dlp
    pub ytdlp: Map<String, Value>,
}

impl ResolvedConfig {
    /// Load configuration.
    ///
    /// `root` defaults to the current directory; `config_path` defaults to
    /// `<root>/config.json`. A missing default config file means defaults;
    /// a config file named explicitly must exist.
    pub fn load(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let (file, config_file) = match config_path {
            Some(path) => {
                let path = paths::resolve_path(&root, &path.to_string_lossy());
                (load_config_file(&path)?, Some(path))
            }
            None => {
                let path = paths::config_file(&root);
                if path.exists() {
                    (load_config_file(&path)?, Some(path))
                } else {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    (ConfigFile::default(), None)
                }
            }
        };

        let ytdlp_env = std::env::var(paths::YTDLP_PATH_ENV).ok();
        Ok(Self::from_file(root, config_file, file, ytdlp_env))
    }

    /// Resolve a parsed config file against `root`
    pub fn from_file(
        root: PathBuf,
        config_file: Option<PathBuf>,
        file: ConfigFile,
        ytdlp_env: Option<String>,
    ) -> Self {
        let csv_file = paths::resolve_path(
            &root,
            file.app.csv_file.as_deref().unwrap_or(paths::DEFAULT_CSV_FILE),
        );

        let save_path = match file.app.save_path.as_deref() {
            Some(save) => paths::resolve_path(&root, &paths::expand_home(save)),
            None => root.join(paths::DEFAULT_SAVE_DIR),
        };

        let ytdlp_binary = ytdlp_env
            .or(file.app.ytdlp_path)
            .unwrap_or_else(|| paths::DEFAULT_YTDLP_BINARY.to_string());

        Self {
            root,
            config_file,
            csv_file,
            save_path,
            ytdlp_binary,
            ytdlp: file.ytdlp,
        }
    }

    /// Create the download directory if missing
    pub async fn ensure_save_path(&self) -> Result<&Path> {
        tokio::fs::create_dir_all(&self.save_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create download directory: {}",
                    self.save_path.display()
                )
            })?;
        Ok(&self.save_path)
    }
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
