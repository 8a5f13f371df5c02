use std::path::PathBuf;

use futures::StreamExt;
use iced::Task;
use tracing::{info, warn};

use crate::application::DownloadCoordinator;
use crate::config::Settings;
use crate::domain::ProgressMessage;
use crate::ui::{Dialog, DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    settings: Settings,
    settings_path: PathBuf,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        Self::with_settings(Settings::load(), Settings::default_path())
    }

    pub fn with_settings(settings: Settings, settings_path: PathBuf) -> Self {
        let view = DownloadView::with_destination(settings.destination_folder.clone());

        Self {
            view,
            settings,
            settings_path,
        }
    }

    fn coordinator(&self) -> DownloadCoordinator {
        DownloadCoordinator::new(self.settings.clone())
    }

    fn remember_destination(&mut self, destination: String) {
        if self.settings.destination_folder == destination {
            return;
        }
        self.settings.destination_folder = destination;
        if let Err(e) = self.settings.save_to(&self.settings_path) {
            warn!("Could not save {}: {}", self.settings_path.display(), e);
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Folder picked in the browse dialog, `None` when cancelled
    DestinationChosen(Option<PathBuf>),
    Progress(ProgressMessage),
    DialogClosed,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => match app.view.begin_download() {
                    Ok(request) => {
                        app.remember_destination(request.destination.display().to_string());
                        info!("Starting download of {}", request.url);

                        return Task::stream(
                            app.coordinator()
                                .download_stream(request)
                                .map(Message::Progress),
                        );
                    }
                    Err(e) => {
                        warn!("Download not started: {}", e);
                        return show_dialog(Dialog::validation(&e));
                    }
                },
                DownloadMessage::BrowsePressed => {
                    let coordinator = app.coordinator();
                    let current = app.view.destination.clone();
                    return Task::perform(
                        async move { coordinator.choose_destination(current).await },
                        Message::DestinationChosen,
                    );
                }
                DownloadMessage::UrlChanged(_) | DownloadMessage::DestinationChanged(_) => {}
            }
        }
        Message::DestinationChosen(Some(path)) => {
            let destination = path.display().to_string();
            app.view.destination = destination.clone();
            app.remember_destination(destination);
        }
        Message::DestinationChosen(None) => {}
        Message::Progress(progress) => {
            if progress.is_terminal() {
                info!("Download ended: {:?}", progress);
            }
            if let Some(dialog) = app.view.apply(progress) {
                return show_dialog(dialog);
            }
        }
        Message::DialogClosed => {}
    }
    Task::none()
}

fn show_dialog(dialog: Dialog) -> Task<Message> {
    let (level, title, body) = match dialog {
        Dialog::Info { title, body } => (rfd::MessageLevel::Info, title, body),
        Dialog::Error { title, body } => (rfd::MessageLevel::Error, title, body),
    };

    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(level)
                .set_title(&title)
                .set_description(&body)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::DialogClosed,
    )
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
