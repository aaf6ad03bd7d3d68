pub mod error;
pub mod model;
pub mod settings;

pub use error::AppError;
pub use model::{
    Bitrate, DownloadOutcome, DownloadPhase, DownloadPlan, DownloadRequest, ThemeChoice,
};
pub use settings::Settings;
