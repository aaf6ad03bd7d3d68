use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::domain::{AppError, DownloadRequest};

fn ytdlp_bin() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

fn ffmpeg_bin() -> &'static str {
    if cfg!(target_os = "windows") {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    }
}

/// Result of the startup probe for the external tools.
#[derive(Debug, Clone)]
pub struct ToolingReport {
    /// Version string when yt-dlp answered `--version`.
    pub ytdlp: Option<String>,
    pub ffmpeg_found: bool,
}

impl ToolingReport {
    pub fn ready(&self) -> bool {
        self.ytdlp.is_some() && self.ffmpeg_found
    }

    /// Name of the first missing tool, if any.
    pub fn missing(&self) -> Option<&'static str> {
        if self.ytdlp.is_none() {
            Some("yt-dlp")
        } else if !self.ffmpeg_found {
            Some("ffmpeg")
        } else {
            None
        }
    }
}

/// The slice of `--dump-json` output we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub id: String,
    pub title: String,
}

/// Thin handle around the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(ytdlp_bin()),
        }
    }
}

impl YtDlp {
    /// Run `yt-dlp --version` and `ffmpeg -version` once at startup.
    pub async fn probe_tools(&self) -> ToolingReport {
        let ytdlp = match Command::new(&self.binary).arg("--version").output().await {
            Ok(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            }
            _ => None,
        };

        let ffmpeg_found = matches!(
            Command::new(ffmpeg_bin())
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await,
            Ok(status) if status.success()
        );

        debug!(ytdlp = ?ytdlp, ffmpeg_found, "tool probe finished");
        ToolingReport { ytdlp, ffmpeg_found }
    }

    /// Ask yt-dlp for the video metadata without downloading anything.
    pub async fn inspect(&self, url: &str) -> Result<TrackInfo, AppError> {
        let output = Command::new(&self.binary)
            .args(["--dump-json", "--no-playlist", "--no-warnings"])
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next().unwrap_or_default();
        serde_json::from_str(line)
            .map_err(|e| AppError::DownloadFailed(format!("Unreadable metadata: {}", e)))
    }

    /// Argument list for the actual download. A separate function so tests
    /// can check the exact bitrate and output hand-off.
    pub fn download_args(request: &DownloadRequest, target: &Path) -> Vec<String> {
        let stem = target
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        // yt-dlp expands % sequences in -o, a literal percent must be doubled
        let template = dir.join(format!("{}.%(ext)s", stem.replace('%', "%%")));

        vec![
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            format!("{}K", request.bitrate.kbps()),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            request.url.clone(),
        ]
    }

    /// Spawn the download child with piped output. `kill_on_drop` ties the
    /// process lifetime to whoever holds the handle.
    pub fn spawn_download(&self, args: &[String]) -> Result<Child, AppError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.spawn().map_err(spawn_error)
    }
}

fn spawn_error(err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        AppError::MissingDependency("yt-dlp")
    } else {
        AppError::DownloadFailed(err.to_string())
    }
}

/// Map a yt-dlp stderr dump onto the error taxonomy.
pub fn classify_failure(stderr: &str) -> AppError {
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url")
        || lower.contains("is not a valid url")
        || lower.contains("incomplete youtube id")
        || lower.contains("truncated youtube id")
    {
        return AppError::InvalidUrl;
    }

    if lower.contains("ffprobe and ffmpeg not found") || lower.contains("ffmpeg not found") {
        return AppError::MissingDependency("ffmpeg");
    }

    let reason = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp exited with an error")
        .to_string();
    AppError::DownloadFailed(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bitrate;

    fn request(bitrate: Bitrate) -> DownloadRequest {
        DownloadRequest {
            url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            dest_dir: PathBuf::from("/tmp/music"),
            bitrate,
        }
    }

    #[test]
    fn download_args_carry_bitrate() {
        for (bitrate, expected) in [
            (Bitrate::Kbps128, "128K"),
            (Bitrate::Kbps192, "192K"),
            (Bitrate::Kbps320, "320K"),
        ] {
            let args = YtDlp::download_args(&request(bitrate), Path::new("/tmp/music/Song.mp3"));
            let pos = args
                .iter()
                .position(|a| a == "--audio-quality")
                .expect("quality flag present");
            assert_eq!(args[pos + 1], expected);
        }
    }

    #[test]
    fn download_args_shape() {
        let req = request(Bitrate::Kbps192);
        let args = YtDlp::download_args(&req, Path::new("/tmp/music/My Song.mp3"));

        assert_eq!(args[0], "-x");
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last(), Some(&req.url));

        let pos = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[pos + 1], "/tmp/music/My Song.%(ext)s");
    }

    #[test]
    fn download_args_escape_percent_in_template() {
        let args = YtDlp::download_args(
            &request(Bitrate::Kbps192),
            Path::new("/tmp/music/100% Hits.mp3"),
        );
        let pos = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[pos + 1], "/tmp/music/100%% Hits.%(ext)s");
    }

    #[test]
    fn classify_unsupported_url() {
        let err = classify_failure("ERROR: Unsupported URL: ftp://example.com\n");
        assert!(matches!(err, AppError::InvalidUrl));
    }

    #[test]
    fn classify_missing_ffmpeg() {
        let err = classify_failure(
            "ERROR: Postprocessing: ffprobe and ffmpeg not found. Please install or provide the path\n",
        );
        assert!(matches!(err, AppError::MissingDependency("ffmpeg")));
    }

    #[test]
    fn classify_generic_failure_keeps_last_line() {
        let err = classify_failure("WARNING: something minor\nERROR: Video unavailable\n");
        match err {
            AppError::DownloadFailed(reason) => assert_eq!(reason, "ERROR: Video unavailable"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn classify_empty_stderr() {
        let err = classify_failure("");
        assert!(matches!(err, AppError::DownloadFailed(_)));
    }

    #[test]
    fn tooling_report_missing_order() {
        let both = ToolingReport {
            ytdlp: Some("2025.01.15".to_string()),
            ffmpeg_found: true,
        };
        assert!(both.ready());
        assert_eq!(both.missing(), None);

        let no_ytdlp = ToolingReport {
            ytdlp: None,
            ffmpeg_found: true,
        };
        assert_eq!(no_ytdlp.missing(), Some("yt-dlp"));

        let no_ffmpeg = ToolingReport {
            ytdlp: Some("2025.01.15".to_string()),
            ffmpeg_found: false,
        };
        assert_eq!(no_ffmpeg.missing(), Some("ffmpeg"));
        assert!(!no_ffmpeg.ready());
    }

    #[test]
    fn track_info_from_dump_json() {
        let json = r#"{"id":"dQw4w9WgXcQ","title":"Example Song","uploader":"Somebody"}"#;
        let info: TrackInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Example Song");
    }
}
