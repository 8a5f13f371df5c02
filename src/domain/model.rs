use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A validated download: both fields were non-empty when it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
}

/// Who turns the downloaded streams into the final container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemuxMode {
    /// yt-dlp merges the streams itself (`--merge-output-format`).
    #[default]
    Merge,
    /// The download is handed to ffmpeg afterwards and the intermediate file removed.
    Ffmpeg,
}

/// One update from the background download.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<f64>,
        /// Bytes per second
        speed: Option<f64>,
        percent_str: Option<String>,
        speed_str: Option<String>,
    },
    Finished {
        filename: Option<PathBuf>,
    },
    Remuxing {
        input: PathBuf,
        /// Target container, e.g. `mp4`
        container: String,
    },
    Success {
        filepath: PathBuf,
    },
    Error {
        message: String,
    },
}

impl ProgressMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

impl From<crate::domain::AppError> for ProgressMessage {
    fn from(err: crate::domain::AppError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Downloading,
    Completed,
    Failed,
}
