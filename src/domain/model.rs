use std::fmt;
use std::path::PathBuf;

/// Target MP3 bitrate, handed through to the audio extraction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitrate {
    Kbps128,
    Kbps192,
    Kbps320,
}

impl Bitrate {
    pub const ALL: [Bitrate; 3] = [Bitrate::Kbps128, Bitrate::Kbps192, Bitrate::Kbps320];

    pub fn kbps(self) -> u32 {
        match self {
            Bitrate::Kbps128 => 128,
            Bitrate::Kbps192 => 192,
            Bitrate::Kbps320 => 320,
        }
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Bitrate::Kbps192
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.kbps())
    }
}

/// The two fixed UI themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Light,
    Dark,
}

impl Default for ThemeChoice {
    fn default() -> Self {
        ThemeChoice::Dark
    }
}

/// One press of the download button, snapshotted from the current settings.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub dest_dir: PathBuf,
    pub bitrate: Bitrate,
}

/// What the metadata probe learned, plus the output path committed to
/// before the download starts.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub title: String,
    pub target: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub title: String,
    pub file: PathBuf,
    pub bitrate: Bitrate,
    /// A failed log append ends up here; it never fails the download itself.
    pub log_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Inspecting,
    Fetching,
    Converting,
    Done,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_values() {
        assert_eq!(Bitrate::Kbps128.kbps(), 128);
        assert_eq!(Bitrate::Kbps192.kbps(), 192);
        assert_eq!(Bitrate::Kbps320.kbps(), 320);
        assert_eq!(Bitrate::default(), Bitrate::Kbps192);
    }

    #[test]
    fn bitrate_labels() {
        assert_eq!(Bitrate::Kbps320.to_string(), "320 kbps");
        assert_eq!(Bitrate::ALL.len(), 3);
    }
}
