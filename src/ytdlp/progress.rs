use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::trace;

use super::command::FINAL_PATH_MARKER;
use crate::domain::ProgressMessage;

/// What a single stdout line of yt-dlp means to us.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress(ProgressMessage),
    FinalPath(PathBuf),
    Other,
}

/// The progress dict yt-dlp hands to its hooks, as printed by the template.
/// Byte counts are floats for some fragment downloads, so read them as such.
#[derive(Debug, Deserialize)]
struct RawProgress {
    status: String,
    #[serde(default)]
    downloaded_bytes: Option<f64>,
    #[serde(default)]
    total_bytes: Option<f64>,
    #[serde(default)]
    total_bytes_estimate: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default, rename = "_percent_str")]
    percent_str: Option<String>,
    #[serde(default, rename = "_speed_str")]
    speed_str: Option<String>,
    #[serde(default)]
    filename: Option<PathBuf>,
}

impl RawProgress {
    fn into_message(self) -> Option<ProgressMessage> {
        match self.status.as_str() {
            "downloading" => Some(ProgressMessage::Downloading {
                downloaded_bytes: self.downloaded_bytes.unwrap_or(0.0).max(0.0) as u64,
                total_bytes: self.total_bytes.map(|t| t.max(0.0) as u64),
                total_bytes_estimate: self.total_bytes_estimate,
                speed: self.speed,
                percent_str: clean(self.percent_str),
                speed_str: clean(self.speed_str),
            }),
            "finished" => Some(ProgressMessage::Finished {
                filename: self.filename,
            }),
            _ => None,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "Unknown" && s != "N/A")
}

pub fn parse_line(line: &str) -> OutputLine {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(path) = line.strip_prefix(FINAL_PATH_MARKER) {
        let path = path.trim();
        if path.is_empty() || path == "NA" {
            return OutputLine::Other;
        }
        return OutputLine::FinalPath(PathBuf::from(path));
    }

    if line.trim_start().starts_with('{') {
        match serde_json::from_str::<RawProgress>(line) {
            Ok(raw) => {
                if let Some(message) = raw.into_message() {
                    return OutputLine::Progress(message);
                }
            }
            Err(e) => trace!("Unparsable progress line ({}): {}", e, line),
        }
        return OutputLine::Other;
    }

    trace!("yt-dlp: {}", line);
    OutputLine::Other
}

fn error_line_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ERROR:\s*(.+)$").ok()).as_ref()
}

/// Human readable reason for a failed yt-dlp run, taken from its stderr.
pub fn engine_error(stderr: &[String], status: Option<ExitStatus>) -> String {
    let last_error = stderr
        .iter()
        .rev()
        .find_map(|line| error_line_regex()?.captures(line.trim()))
        .map(|caps| caps[1].trim().to_string());

    if let Some(message) = last_error {
        return message;
    }

    if let Some(line) = stderr.iter().rev().find(|l| !l.trim().is_empty()) {
        return line.trim().to_string();
    }

    match status {
        Some(status) => format!("yt-dlp exited with {}", status),
        None => "yt-dlp exited unexpectedly".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_downloading() {
        let line = r#"{"status": "downloading", "downloaded_bytes": 1024, "total_bytes": 4096, "total_bytes_estimate": null, "speed": 2048.5, "_percent_str": " 25.0%", "_speed_str": "2.00KiB/s", "filename": "/tmp/a.f137.mp4"}"#;

        assert_eq!(
            parse_line(line),
            OutputLine::Progress(ProgressMessage::Downloading {
                downloaded_bytes: 1024,
                total_bytes: Some(4096),
                total_bytes_estimate: None,
                speed: Some(2048.5),
                percent_str: Some("25.0%".to_string()),
                speed_str: Some("2.00KiB/s".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_downloading_without_totals() {
        let line = r#"{"status": "downloading", "downloaded_bytes": 10.0, "speed": null, "_speed_str": "Unknown"}"#;

        match parse_line(line) {
            OutputLine::Progress(ProgressMessage::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed_str,
                ..
            }) => {
                assert_eq!(downloaded_bytes, 10);
                assert_eq!(total_bytes, None);
                assert_eq!(total_bytes_estimate, None);
                assert_eq!(speed_str, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_finished_and_final_path() {
        let line = r#"{"status": "finished", "downloaded_bytes": 4096, "filename": "/tmp/a.f137.mp4"}"#;
        assert_eq!(
            parse_line(line),
            OutputLine::Progress(ProgressMessage::Finished {
                filename: Some(PathBuf::from("/tmp/a.f137.mp4"))
            })
        );

        assert_eq!(
            parse_line("[final-path] /tmp/My Video.mp4\r\n"),
            OutputLine::FinalPath(PathBuf::from("/tmp/My Video.mp4"))
        );
        assert_eq!(parse_line("[final-path] NA"), OutputLine::Other);
    }

    #[test]
    fn test_other_lines() {
        assert_eq!(parse_line("[youtube] abc: Downloading webpage"), OutputLine::Other);
        assert_eq!(parse_line("{not json"), OutputLine::Other);
        assert_eq!(parse_line(r#"{"status": "error"}"#), OutputLine::Other);
    }

    #[test]
    fn test_engine_error_prefers_last_error_line() {
        let stderr = vec![
            "WARNING: something odd".to_string(),
            "ERROR: [youtube] abc: Video unavailable".to_string(),
            "".to_string(),
        ];
        assert_eq!(
            engine_error(&stderr, None),
            "[youtube] abc: Video unavailable"
        );
    }

    #[test]
    fn test_engine_error_fallbacks() {
        let stderr = vec!["Traceback (most recent call last):".to_string(), "boom".to_string()];
        assert_eq!(engine_error(&stderr, None), "boom");
        assert_eq!(engine_error(&[], None), "yt-dlp exited unexpectedly");
    }
}
