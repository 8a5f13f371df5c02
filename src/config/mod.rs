//! Persisted user settings.
//!
//! Stored as a single `[settings]` table in `settings.toml` under the
//! platform config directory. Only `destination_folder` is written back by the
//! window; the rest are knobs for whoever runs the tool.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{AppError, RemuxMode};

const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub destination_folder: String,
    /// yt-dlp format selector
    pub format: String,
    /// Final container, e.g. `mp4`
    pub container: String,
    pub remux: RemuxMode,
    pub ytdlp_path: String,
    pub ffmpeg_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            destination_folder: String::new(),
            format: "bestvideo+bestaudio/best".to_string(),
            container: "mp4".to_string(),
            remux: RemuxMode::Merge,
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    settings: Settings,
}

impl Settings {
    /// `settings.toml` in the platform config dir, or the working directory
    /// when no home directory can be resolved.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("", "", "yt-dlp-gui") {
            Some(dirs) => dirs.config_dir().join(SETTINGS_FILE_NAME),
            None => PathBuf::from(SETTINGS_FILE_NAME),
        }
    }

    /// A missing file is not an error and yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::Io(e.to_string())),
        };

        let file: SettingsFile =
            toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(file.settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io(e.to_string()))?;
        }

        let content = toml::to_string(&SettingsFile {
            settings: self.clone(),
        })
        .map_err(|e| AppError::Config(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| AppError::Io(e.to_string()))
    }

    /// Never fails: unreadable settings are logged and replaced by defaults.
    pub fn load() -> Self {
        let path = Self::default_path();
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("Ignoring settings at {}: {}", path.display(), e);
            Self::default()
        })
    }
}
