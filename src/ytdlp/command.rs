use std::ffi::OsString;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::Settings;
use crate::domain::{DownloadRequest, RemuxMode};

/// Prefix of the line yt-dlp prints once the file reached its final location.
pub const FINAL_PATH_MARKER: &str = "[final-path] ";

/// One JSON object per progress update (see `yt-dlp --progress-template`).
const PROGRESS_TEMPLATE: &str = "download:%(progress)j";

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

pub fn build_args(settings: &Settings, request: &DownloadRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        // Force new lines
        "--newline",
        // --print implies --quiet, keep the progress lines anyway
        "--progress",
        "--no-color",
        "--progress-template",
        PROGRESS_TEMPLATE,
        "--print",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format!("after_move:{}%(filepath)s", FINAL_PATH_MARKER).into());
    args.push("-f".into());
    args.push(settings.format.clone().into());
    args.push("-o".into());
    args.push(request.destination.join(OUTPUT_TEMPLATE).into_os_string());

    if settings.remux == RemuxMode::Merge {
        args.push("--merge-output-format".into());
        args.push(settings.container.clone().into());
    }

    // Keep URLs starting with '-' from being read as options
    args.push("--".into());
    args.push(request.url.clone().into());
    args
}

pub fn build_command(settings: &Settings, request: &DownloadRequest) -> Command {
    let mut cmd = Command::new(&settings.ytdlp_path);
    cmd.args(build_args(settings, request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}
