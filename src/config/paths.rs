//! Canonical file names and path helpers.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── config.json     # optional, see crate::config
//! ├── data.csv        # catalog (app.csv_file)
//! └── downloads/      # media (app.save_path)
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the project root
pub const HOME_ENV: &str = "PLDL_HOME";

/// Environment variable overriding the yt-dlp executable
pub const YTDLP_PATH_ENV: &str = "YTDLP_PATH";

/// Config file name, looked up in the root
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default catalog file name
pub const DEFAULT_CSV_FILE: &str = "data.csv";

/// Default download directory name
pub const DEFAULT_SAVE_DIR: &str = "downloads";

/// yt-dlp executable looked up on PATH by default
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Config file location for a root
pub fn config_file(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Resolve a path that may be relative to `base`
pub fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path_str: &str) -> String {
    let rest = match path_str.strip_prefix("~/") {
        Some(rest) => rest,
        None if path_str == "~" => "",
        None => return path_str.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest).to_string_lossy().into_owned(),
        None => path_str.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "data.csv"),
            PathBuf::from("/home/user/project/data.csv")
        );
        assert_eq!(
            resolve_path(&base, "../sibling/data.csv"),
            PathBuf::from("/home/user/project/../sibling/data.csv")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/data.csv"),
            PathBuf::from("/absolute/data.csv")
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/srv/media"), "/srv/media");
        assert_eq!(expand_home("media"), "media");
        assert_eq!(expand_home("~user/media"), "~user/media");

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                PathBuf::from(expand_home("~/Videos")),
                home.join("Videos")
            );
        }
    }

    #[test]
    fn test_config_file_location() {
        assert_eq!(
            config_file(Path::new("/project")),
            PathBuf::from("/project/config.json")
        );
    }
}
