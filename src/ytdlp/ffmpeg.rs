use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::AppError;

/// Where the remuxed file goes, or `None` when `input` already uses `container`.
pub fn remux_target(input: &Path, container: &str) -> Option<PathBuf> {
    let already = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(container));

    if already {
        None
    } else {
        Some(input.with_extension(container))
    }
}

/// Copies the streams of `input` into `output` without re-encoding.
pub async fn remux(ffmpeg: &str, input: &Path, output: &Path) -> Result<(), AppError> {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-y")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(input)
        .args(["-c", "copy"])
        .arg(output)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    debug!("ffmpeg params: {:?}", cmd);

    let result = cmd
        .output()
        .await
        .map_err(|e| AppError::Spawn(format!("{}: {}", ffmpeg, e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| format!("ffmpeg exited with {}", result.status));
        return Err(AppError::Remux(reason));
    }

    Ok(())
}

/// Remuxes `input` into `container` and deletes the intermediate file.
/// Returns the path of the file the user ends up with.
pub async fn remux_and_replace(
    ffmpeg: &str,
    input: &Path,
    container: &str,
) -> Result<PathBuf, AppError> {
    let Some(output) = remux_target(input, container) else {
        debug!("{} is already {}, skipping remux", input.display(), container);
        return Ok(input.to_path_buf());
    };

    if output.exists() {
        warn!("{} already exists and will be overwritten", output.display());
    }

    if let Err(e) = remux(ffmpeg, input, &output).await {
        // ffmpeg ran and may have written part of the output before failing
        if !matches!(e, AppError::Remux(_)) {
            return Err(e);
        }
        match tokio::fs::remove_file(&output).await {
            Ok(()) => debug!("Removed partial {}", output.display()),
            Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
            Err(rm) => warn!("Could not remove partial {}: {}", output.display(), rm),
        }
        return Err(e);
    }
    info!("Remuxed {} -> {}", input.display(), output.display());

    if let Err(e) = tokio::fs::remove_file(input).await {
        warn!("Could not remove {}: {}", input.display(), e);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remux_target() {
        assert_eq!(
            remux_target(Path::new("/tmp/clip.webm"), "mp4"),
            Some(PathBuf::from("/tmp/clip.mp4"))
        );
        assert_eq!(
            remux_target(Path::new("/tmp/Some.Title.mkv"), "mp4"),
            Some(PathBuf::from("/tmp/Some.Title.mp4"))
        );
        assert_eq!(remux_target(Path::new("/tmp/clip.MP4"), "mp4"), None);
    }

    #[tokio::test]
    async fn test_already_in_container_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, b"data").unwrap();

        let out = remux_and_replace("ffmpeg-does-not-exist", &input, "mp4")
            .await
            .unwrap();
        assert_eq!(out, input);
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        std::fs::write(&input, b"data").unwrap();

        let err = remux_and_replace("ffmpeg-does-not-exist", &input, "mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Spawn(_)));
        // the download is kept when remuxing fails
        assert!(input.exists());
    }

    #[cfg(unix)]
    fn stub_ffmpeg(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_remux_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        std::fs::write(&input, b"data").unwrap();
        // -y -loglevel error -i <input> -c copy <output>
        let ffmpeg = stub_ffmpeg(
            dir.path(),
            "printf partial > \"$8\"\necho 'Invalid data found' >&2\nexit 1",
        );

        let err = remux_and_replace(&ffmpeg, &input, "mp4").await.unwrap_err();

        assert_eq!(err, AppError::Remux("Invalid data found".to_string()));
        assert!(input.exists());
        assert!(!dir.path().join("clip.mp4").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_target_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        let target = dir.path().join("clip.mp4");
        std::fs::write(&input, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "cp \"$5\" \"$8\"");

        let out = remux_and_replace(&ffmpeg, &input, "mp4").await.unwrap();

        assert_eq!(out, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!input.exists());
    }
}
