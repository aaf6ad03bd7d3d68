use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::domain::AppError;

/// Turn a video title into a safe filename stem
pub fn sanitize_title(title: &str) -> String {
    let cleaned = title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>();

    let trimmed = cleaned.trim().trim_end_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "audio".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First `<stem>.mp3` path in `dir` that does not exist yet, trying
/// `<stem> (1).mp3`, `<stem> (2).mp3`, ... on collision
pub fn unique_destination(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{}.mp3", stem));
    if !first.exists() {
        return first;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{} ({}).mp3", stem, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Check that `dir` is an existing directory we can actually create files
/// in, by opening and removing a zero-byte probe file
pub fn ensure_writable_dir(dir: &Path) -> Result<(), AppError> {
    if !dir.is_dir() {
        return Err(AppError::InvalidFolder(dir.display().to_string()));
    }

    let probe = dir.join(format!(".write-check-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(file) => {
            drop(file);
            let _ = std::fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(AppError::InvalidFolder(dir.display().to_string())),
    }
}

/// The user's Downloads directory, falling back to home, then the
/// working directory
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("test/file"), "test_file");
        assert_eq!(sanitize_title("normal-name"), "normal-name");
        assert_eq!(sanitize_title("a<b>c:d\"e|f?g*h"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_title("  Song Title.. "), "Song Title");
    }

    #[test]
    fn test_sanitize_title_fallback() {
        assert_eq!(sanitize_title(""), "audio");
        assert_eq!(sanitize_title("   "), "audio");
        assert_eq!(sanitize_title("..."), "audio");
    }

    #[test]
    fn test_unique_destination() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_destination(dir.path(), "Song");
        assert_eq!(first, dir.path().join("Song.mp3"));

        std::fs::write(&first, b"x").unwrap();
        let second = unique_destination(dir.path(), "Song");
        assert_eq!(second, dir.path().join("Song (1).mp3"));

        std::fs::write(&second, b"x").unwrap();
        let third = unique_destination(dir.path(), "Song");
        assert_eq!(third, dir.path().join("Song (2).mp3"));
    }

    #[test]
    fn test_ensure_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_writable_dir(dir.path()).is_ok());
        assert!(ensure_writable_dir(Path::new("/no/such/folder")).is_err());
    }

    #[test]
    fn test_default_download_dir_is_absolute_or_cwd() {
        let dir = default_download_dir();
        assert!(dir.is_absolute() || dir == Path::new("."));
    }
}
