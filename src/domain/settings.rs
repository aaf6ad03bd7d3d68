use std::path::{Path, PathBuf};

use crate::domain::{AppError, Bitrate, ThemeChoice};
use crate::utils;

/// Session settings, owned by the app state and only touched on the UI
/// thread. Nothing here is persisted across restarts.
#[derive(Debug, Clone)]
pub struct Settings {
    output_dir: PathBuf,
    bitrate: Bitrate,
    theme: ThemeChoice,
    last_download: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: utils::default_download_dir(),
            bitrate: Bitrate::default(),
            theme: ThemeChoice::default(),
            last_download: None,
        }
    }
}

impl Settings {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn bitrate(&self) -> Bitrate {
        self.bitrate
    }

    pub fn theme(&self) -> ThemeChoice {
        self.theme
    }

    pub fn last_download(&self) -> Option<&Path> {
        self.last_download.as_deref()
    }

    /// Accepts only an existing, writable directory; on rejection the
    /// previous folder stays active.
    pub fn set_output_dir(&mut self, dir: PathBuf) -> Result<(), AppError> {
        utils::ensure_writable_dir(&dir)?;
        self.output_dir = dir;
        Ok(())
    }

    pub fn set_bitrate(&mut self, bitrate: Bitrate) {
        self.bitrate = bitrate;
    }

    pub fn set_theme(&mut self, theme: ThemeChoice) {
        self.theme = theme;
    }

    pub fn record_download(&mut self, file: PathBuf) {
        self.last_download = Some(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bitrate(), Bitrate::Kbps192);
        assert_eq!(settings.theme(), ThemeChoice::Dark);
        assert!(settings.last_download().is_none());
    }

    #[test]
    fn accepts_writable_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.set_output_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(settings.output_dir(), dir.path());
    }

    #[test]
    fn rejects_missing_folder_and_keeps_previous() {
        let mut settings = Settings::default();
        let before = settings.output_dir().to_path_buf();
        let result = settings.set_output_dir(PathBuf::from("/no/such/folder/anywhere"));
        assert!(matches!(result, Err(AppError::InvalidFolder(_))));
        assert_eq!(settings.output_dir(), before);
    }

    #[test]
    fn rejects_plain_file_as_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_output_dir(file),
            Err(AppError::InvalidFolder(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_read_only_folder() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        // root ignores permission bits, the probe would succeed anyway
        if std::fs::metadata(dir.path()).unwrap().uid() == 0 {
            return;
        }
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let mut settings = Settings::default();
        let result = settings.set_output_dir(locked.clone());

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(AppError::InvalidFolder(_))));
    }
}
