use thiserror::Error;

/// Everything that can fail, in a form the UI can show as a status line.
/// Variants carry strings instead of source errors so they stay `Clone`
/// and can travel inside iced messages.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Folder does not exist or is not writable: {0}")]
    InvalidFolder(String),

    #[error("Invalid or unsupported URL")]
    InvalidUrl,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("A download is already running")]
    DownloadInProgress,

    #[error("Could not write download log: {0}")]
    LogWrite(String),

    #[error("Nothing downloaded yet")]
    NoFileSelected,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("{0} was not found on PATH")]
    MissingDependency(&'static str),
}
