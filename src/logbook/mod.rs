use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::{AppError, Bitrate};

/// Log file name, created in the working directory on first use.
pub const LOG_FILE: &str = "yt_music_log.txt";

/// One completed download, as it goes into the log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub title: String,
    pub bitrate: Bitrate,
    pub path: PathBuf,
}

impl LogEntry {
    fn render(&self, timestamp: &str) -> String {
        format!(
            "{} | {} | {}kbps | {}\n",
            timestamp,
            self.title,
            self.bitrate.kbps(),
            self.path.display()
        )
    }
}

/// Append one record to the default log file.
pub async fn append(entry: &LogEntry) -> Result<(), AppError> {
    append_to(Path::new(LOG_FILE), entry).await
}

/// Append one record to `log_path`, creating the file if needed. Existing
/// lines are never rewritten. The handle is closed before returning.
pub async fn append_to(log_path: &Path, entry: &LogEntry) -> Result<(), AppError> {
    let line = entry.render(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)
        .await
        .map_err(|e| AppError::LogWrite(e.to_string()))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| AppError::LogWrite(e.to_string()))?;
    file.flush()
        .await
        .map_err(|e| AppError::LogWrite(e.to_string()))?;

    debug!(path = %log_path.display(), title = %entry.title, "appended log entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> LogEntry {
        LogEntry {
            title: title.to_string(),
            bitrate: Bitrate::Kbps192,
            path: PathBuf::from("/tmp/music").join(format!("{}.mp3", title)),
        }
    }

    #[tokio::test]
    async fn appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE);

        append_to(&log, &entry("First Song")).await.unwrap();
        append_to(&log, &entry("Second Song")).await.unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("First Song"));
        assert!(lines[1].contains("Second Song"));
    }

    #[tokio::test]
    async fn line_format() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE);

        append_to(&log, &entry("Example Song")).await.unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        let line = contents.lines().next().unwrap();
        assert!(line.ends_with("| Example Song | 192kbps | /tmp/music/Example Song.mp3"));

        // timestamp field comes first: "YYYY-MM-DD HH:MM:SS"
        let stamp = line.split(" | ").next().unwrap();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[13..14], ":");
    }

    #[tokio::test]
    async fn keeps_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE);
        std::fs::write(&log, "old line\n").unwrap();

        append_to(&log, &entry("New Song")).await.unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.starts_with("old line\n"));
        assert!(contents.contains("New Song"));
    }

    #[tokio::test]
    async fn reports_unwritable_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("missing").join(LOG_FILE);

        let result = append_to(&log, &entry("Song")).await;
        assert!(matches!(result, Err(AppError::LogWrite(_))));
    }
}
