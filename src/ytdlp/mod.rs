pub mod client;
pub mod progress;

pub use client::{classify_failure, ToolingReport, TrackInfo, YtDlp};
pub use progress::{parse_line, ProgressLine};
