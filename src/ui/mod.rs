use iced::{
    widget::{button, column, progress_bar, row, text, text_input, Space},
    Alignment, Element, Length,
};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{AppError, DownloadPhase, DownloadRequest, ProgressMessage};
use crate::utils::{download_percent, format_bytes, format_speed};

/// A blocking message box the app should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Info { title: String, body: String },
    Error { title: String, body: String },
}

impl Dialog {
    pub fn validation(err: &AppError) -> Self {
        Self::Error {
            title: "Error".to_string(),
            body: err.to_string(),
        }
    }
}

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub destination: String,
    pub status_message: String,
    /// 0.0 to 100.0
    pub percent: f32,
    pub phase: DownloadPhase,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            destination: String::new(),
            status_message: "Ready.".to_string(),
            percent: 0.0,
            phase: DownloadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    DestinationChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn with_destination(destination: String) -> Self {
        Self {
            destination,
            ..Default::default()
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.phase == DownloadPhase::Downloading
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::DestinationChanged(destination) => {
                self.destination = destination;
            }
            DownloadMessage::BrowsePressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Validates the form and switches to the downloading state.
    /// On error nothing changes and no download may be started.
    pub fn begin_download(&mut self) -> Result<DownloadRequest, AppError> {
        if self.is_downloading() {
            return Err(AppError::Busy);
        }

        let url = self.url.trim();
        if url.is_empty() {
            return Err(AppError::MissingUrl);
        }
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(AppError::MissingDestination);
        }

        let request = DownloadRequest {
            url: url.to_string(),
            destination: PathBuf::from(destination),
        };

        self.phase = DownloadPhase::Downloading;
        self.status_message = "Starting download...".to_string();
        self.percent = 0.0;

        Ok(request)
    }

    /// Reflects one background message. Returns the dialog to show once the
    /// download is over.
    pub fn apply(&mut self, message: ProgressMessage) -> Option<Dialog> {
        if !self.is_downloading() {
            debug!("Ignoring late message: {:?}", message);
            return None;
        }

        match message {
            ProgressMessage::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed,
                percent_str,
                speed_str,
            } => {
                if let Some(percent) =
                    download_percent(downloaded_bytes, total_bytes, total_bytes_estimate)
                {
                    self.percent = percent;
                }

                if let Some(speed) = speed {
                    let percent_str =
                        percent_str.unwrap_or_else(|| format!("{:.1}%", self.percent));
                    let speed_str = speed_str.unwrap_or_else(|| format_speed(speed));
                    self.status_message =
                        format!("Downloading... {} at {}", percent_str, speed_str);
                } else if total_bytes.is_none() && total_bytes_estimate.is_none() {
                    self.status_message = format!(
                        "Downloading... {}",
                        format_bytes(downloaded_bytes as f64)
                    );
                }
                None
            }
            ProgressMessage::Finished { .. } => {
                self.status_message = "Download finished. Converting, please wait...".to_string();
                None
            }
            ProgressMessage::Remuxing { input, container } => {
                debug!("Remuxing {} into {}", input.display(), container);
                self.status_message = format!("Remuxing into {}...", container);
                None
            }
            ProgressMessage::Success { filepath } => {
                self.phase = DownloadPhase::Completed;
                self.status_message = "Ready.".to_string();
                self.percent = 100.0;
                self.url.clear();
                Some(Dialog::Info {
                    title: "Success".to_string(),
                    body: format!("Download complete!\nSaved to: {}", filepath.display()),
                })
            }
            ProgressMessage::Error { message } => {
                self.phase = DownloadPhase::Failed;
                self.status_message = "Error.".to_string();
                self.percent = 0.0;
                Some(Dialog::Error {
                    title: "Download error".to_string(),
                    body: message,
                })
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let idle = !self.is_downloading();

        column![
            row![
                text("Video URL:").width(Length::Fixed(90.0)),
                text_input("https://...", &self.url)
                    .on_input(DownloadMessage::UrlChanged)
                    .padding(8),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            row![
                text("Save to:").width(Length::Fixed(90.0)),
                text_input("Destination folder", &self.destination)
                    .on_input(DownloadMessage::DestinationChanged)
                    .padding(8),
                button("Browse...")
                    .on_press_maybe(idle.then_some(DownloadMessage::BrowsePressed))
                    .padding([8, 14]),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            Space::new().height(Length::Fixed(6.0)),
            button("Download")
                .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            row![
                progress_bar(0.0..=100.0, self.percent),
                text(format!("{:.2}%", self.percent))
                    .width(Length::Fixed(70.0))
                    .size(14),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
