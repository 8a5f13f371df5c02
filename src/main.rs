mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;
mod ytdlp;

use iced::{window, Size};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("YT-DLP Downloader")
        .window(window::Settings {
            size: Size::new(640.0, 280.0),
            ..Default::default()
        })
        .run()
}
