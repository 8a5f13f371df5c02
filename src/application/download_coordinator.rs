use std::collections::VecDeque;
use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    domain::{AppError, DownloadRequest, ProgressMessage, RemuxMode},
    ytdlp::{self, ffmpeg, OutputLine},
};

/// How many trailing stderr lines are kept for the error message.
const STDERR_TAIL: usize = 64;

/// Runs one download at a time on behalf of the window.
#[derive(Clone)]
pub struct DownloadCoordinator {
    settings: Settings,
}

impl DownloadCoordinator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn choose_destination(&self, current: String) -> Option<PathBuf> {
        let mut dialog = rfd::AsyncFileDialog::new();
        if !current.is_empty() {
            dialog = dialog.set_directory(&current);
        }

        dialog
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Every message of one download, ending with exactly one
    /// `Success` or `Error`.
    pub fn download_stream(&self, request: DownloadRequest) -> BoxStream<'static, ProgressMessage> {
        futures::stream::unfold(
            DownloadRuntimeState::Start {
                settings: self.settings.clone(),
                request,
            },
            step,
        )
        .boxed()
    }
}

enum DownloadRuntimeState {
    Start {
        settings: Settings,
        request: DownloadRequest,
    },
    Running {
        settings: Settings,
        child: Child,
        stdout: Split<BufReader<ChildStdout>>,
        stderr: JoinHandle<Vec<String>>,
        final_path: Option<PathBuf>,
    },
    Remuxing {
        settings: Settings,
        input: PathBuf,
    },
    Finished,
}

async fn step(
    mut state: DownloadRuntimeState,
) -> Option<(ProgressMessage, DownloadRuntimeState)> {
    loop {
        state = match state {
            DownloadRuntimeState::Start { settings, request } => {
                match spawn_engine(&settings, &request) {
                    Ok((child, stdout, stderr)) => DownloadRuntimeState::Running {
                        settings,
                        child,
                        stdout,
                        stderr,
                        final_path: None,
                    },
                    Err(e) => return Some((e.into(), DownloadRuntimeState::Finished)),
                }
            }
            DownloadRuntimeState::Running {
                settings,
                mut child,
                mut stdout,
                stderr,
                mut final_path,
            } => match stdout.next_segment().await {
                Ok(Some(segment)) => {
                    let line = String::from_utf8_lossy(&segment);
                    match ytdlp::parse_line(&line) {
                        OutputLine::Progress(message) => {
                            return Some((
                                message,
                                DownloadRuntimeState::Running {
                                    settings,
                                    child,
                                    stdout,
                                    stderr,
                                    final_path,
                                },
                            ));
                        }
                        OutputLine::FinalPath(path) => {
                            debug!("Final file: {}", path.display());
                            final_path = Some(path);
                        }
                        OutputLine::Other => {}
                    }
                    DownloadRuntimeState::Running {
                        settings,
                        child,
                        stdout,
                        stderr,
                        final_path,
                    }
                }
                Ok(None) => {
                    return Some(finish_engine(settings, child, stderr, final_path).await);
                }
                Err(e) => {
                    let _ = child.kill().await;
                    return Some((
                        AppError::Io(format!("Failed to read yt-dlp output: {}", e)).into(),
                        DownloadRuntimeState::Finished,
                    ));
                }
            },
            DownloadRuntimeState::Remuxing { settings, input } => {
                let message = match ffmpeg::remux_and_replace(
                    &settings.ffmpeg_path,
                    &input,
                    &settings.container,
                )
                .await
                {
                    Ok(filepath) => ProgressMessage::Success { filepath },
                    Err(e) => e.into(),
                };
                return Some((message, DownloadRuntimeState::Finished));
            }
            DownloadRuntimeState::Finished => return None,
        };
    }
}

fn spawn_engine(
    settings: &Settings,
    request: &DownloadRequest,
) -> Result<(Child, Split<BufReader<ChildStdout>>, JoinHandle<Vec<String>>), AppError> {
    let mut cmd = ytdlp::build_command(settings, request);
    debug!("yt-dlp params: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| AppError::Spawn(format!("{}: {}", settings.ytdlp_path, e)))?;
    info!("Downloading {} into {}", request.url, request.destination.display());

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Io("yt-dlp stdout is not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Io("yt-dlp stderr is not captured".to_string()))?;

    // Drained on its own so a chatty stderr can never block stdout
    let stderr = tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        let mut segments = BufReader::new(stderr).split(b'\n');
        while let Ok(Some(segment)) = segments.next_segment().await {
            let line = String::from_utf8_lossy(&segment).trim_end().to_string();
            debug!("yt-dlp stderr: {}", line);
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        Vec::from(tail)
    });

    Ok((child, BufReader::new(stdout).split(b'\n'), stderr))
}

async fn finish_engine(
    settings: Settings,
    mut child: Child,
    stderr: JoinHandle<Vec<String>>,
    final_path: Option<PathBuf>,
) -> (ProgressMessage, DownloadRuntimeState) {
    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => {
            return (
                AppError::Io(format!("yt-dlp process encountered an error: {}", e)).into(),
                DownloadRuntimeState::Finished,
            )
        }
    };
    let stderr = stderr.await.unwrap_or_else(|e| {
        warn!("stderr reader failed: {}", e);
        Vec::new()
    });

    if !status.success() {
        let message = ytdlp::engine_error(&stderr, Some(status));
        warn!("yt-dlp failed: {}", message);
        return (AppError::Engine(message).into(), DownloadRuntimeState::Finished);
    }

    let Some(filepath) = final_path else {
        return (AppError::MissingOutput.into(), DownloadRuntimeState::Finished);
    };

    match settings.remux {
        RemuxMode::Merge => (
            ProgressMessage::Success { filepath },
            DownloadRuntimeState::Finished,
        ),
        RemuxMode::Ffmpeg => (
            ProgressMessage::Remuxing {
                input: filepath.clone(),
                container: settings.container.clone(),
            },
            DownloadRuntimeState::Remuxing {
                settings,
                input: filepath,
            },
        ),
    }
}
