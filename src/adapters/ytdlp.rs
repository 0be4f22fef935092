//! yt-dlp downloader adapter.
//!
//! Shells out to the `yt-dlp` executable. Options from the `ytdlp` config
//! section are translated into command-line flags; `outtmpl` is rooted under
//! the configured save path.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;

use super::{Downloader, PlaylistInfo};
use crate::config::ResolvedConfig;

/// Output template used when the config does not set `outtmpl`
pub const DEFAULT_OUTTMPL: &str = "%(playlist_title)s/%(title)s.%(ext)s";

/// Python option names whose CLI flag is not a plain kebab-case rename
const OPTION_ALIASES: &[(&str, &str)] = &[
    ("writesubtitles", "write-subs"),
    ("writeautomaticsub", "write-auto-subs"),
    ("subtitleslangs", "sub-langs"),
    ("subtitlesformat", "sub-format"),
    ("writethumbnail", "write-thumbnail"),
    ("writeinfojson", "write-info-json"),
    ("writedescription", "write-description"),
    ("ignoreerrors", "ignore-errors"),
    ("nooverwrites", "no-overwrites"),
    ("noplaylist", "no-playlist"),
    ("cookiefile", "cookies"),
    ("ratelimit", "limit-rate"),
    ("restrictfilenames", "restrict-filenames"),
    ("download_archive", "download-archive"),
];

/// yt-dlp exit code for command-line usage errors
const USAGE_ERROR_CODE: i32 = 2;

/// stderr fragments yt-dlp prints when a playlist is gone or hidden
const MISSING_PLAYLIST_MARKERS: &[&str] = &[
    "does not exist",
    "not available",
    "unavailable",
    "private",
    "HTTP Error 404",
];

/// Errors from running yt-dlp
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to run '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp exited with code {code} while downloading {url}")]
    Failed { url: String, code: i32 },

    #[error("Could not read yt-dlp metadata for {url}: {reason}")]
    Probe { url: String, reason: String },
}

/// Subset of `--dump-single-json` output we care about
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    playlist_count: Option<u64>,
    #[serde(default)]
    entries: Option<Vec<Value>>,
}

/// yt-dlp adapter using subprocess mode
pub struct YtDlpAdapter {
    /// Path to the yt-dlp binary
    binary_path: String,

    /// Directory downloads are written under
    save_path: PathBuf,

    /// Options forwarded from the `ytdlp` config section
    options: Map<String, Value>,
}

impl YtDlpAdapter {
    /// Create an adapter with explicit settings
    pub fn new(
        binary_path: impl Into<String>,
        save_path: impl Into<PathBuf>,
        options: Map<String, Value>,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            save_path: save_path.into(),
            options,
        }
    }

    /// Create an adapter from the resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.ytdlp_binary.clone(),
            config.save_path.clone(),
            config.ytdlp.clone(),
        )
    }

    /// Path of the binary that will be run
    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }

    /// Output template rooted under the save path
    pub fn output_template(&self) -> PathBuf {
        let template = match self.options.get("outtmpl") {
            Some(Value::String(template)) => template.as_str(),
            Some(Value::Object(templates)) => templates
                .get("default")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_OUTTMPL),
            _ => DEFAULT_OUTTMPL,
        };
        self.save_path.join(template)
    }

    /// Flags translated from the forwarded options
    pub fn option_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in &self.options {
            if key == "outtmpl" {
                continue;
            }
            push_option(&mut args, key, value);
        }
        args
    }

    /// Full argument list for a download
    pub fn download_args(&self, playlist_url: &str) -> Vec<String> {
        let mut args = self.option_args();
        args.push("-o".to_string());
        args.push(self.output_template().to_string_lossy().into_owned());
        args.push(playlist_url.to_string());
        args
    }

    /// Full argument list for a metadata probe
    pub fn probe_args(&self, playlist_url: &str) -> Vec<String> {
        let mut args = self.option_args();
        args.extend(
            ["--flat-playlist", "--dump-single-json", "--no-warnings"]
                .into_iter()
                .map(String::from),
        );
        args.push(playlist_url.to_string());
        args
    }

    fn spawn_error(&self, source: std::io::Error) -> DownloadError {
        DownloadError::Spawn {
            binary: self.binary_path.clone(),
            source,
        }
    }
}

/// Translate one config option into CLI flags
fn push_option(args: &mut Vec<String>, key: &str, value: &Value) {
    let flag = option_flag(key);

    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => args.push(flag),
        Value::String(s) => {
            args.push(flag);
            args.push(s.clone());
        }
        Value::Number(n) => {
            args.push(flag);
            args.push(n.to_string());
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            args.push(flag);
            args.push(joined);
        }
        Value::Object(_) => {
            tracing::warn!(option = key, "Skipping yt-dlp option with an object value");
        }
    }
}

/// Whether a failed probe's stderr says the playlist is missing
fn reports_missing_playlist(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    MISSING_PLAYLIST_MARKERS
        .iter()
        .any(|marker| stderr.contains(&marker.to_lowercase()))
}

/// CLI spelling of a config key
fn option_flag(key: &str) -> String {
    if key.starts_with('-') {
        return key.to_string();
    }

    if let Some((_, flag)) = OPTION_ALIASES.iter().find(|(name, _)| *name == key) {
        return format!("--{}", flag);
    }

    format!("--{}", key.replace('_', "-"))
}

#[async_trait]
impl Downloader for YtDlpAdapter {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, playlist_url: &str) -> Result<Option<PlaylistInfo>, DownloadError> {
        let output = Command::new(&self.binary_path)
            .args(self.probe_args(playlist_url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let code = output.status.code();

            if code != Some(USAGE_ERROR_CODE) && reports_missing_playlist(stderr) {
                tracing::warn!(url = playlist_url, stderr, "Playlist not found");
                return Ok(None);
            }

            tracing::warn!(url = playlist_url, ?code, stderr, "yt-dlp probe failed");
            return Err(DownloadError::Probe {
                url: playlist_url.to_string(),
                reason: match stderr.lines().last() {
                    Some(line) => line.to_string(),
                    None => format!("exit code {}", code.unwrap_or(-1)),
                },
            });
        }

        let probe: ProbeOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| DownloadError::Probe {
                url: playlist_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(PlaylistInfo {
            title: probe
                .title
                .unwrap_or_else(|| "Unknown Playlist".to_string()),
            entry_count: probe
                .playlist_count
                .or_else(|| probe.entries.map(|e| e.len() as u64)),
        }))
    }

    async fn download(&self, playlist_url: &str) -> Result<(), DownloadError> {
        let args = self.download_args(playlist_url);
        tracing::info!(binary = %self.binary_path, ?args, "Running yt-dlp");

        // Progress goes straight to the terminal
        let status = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(DownloadError::Failed {
                url: playlist_url.to_string(),
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }
}
