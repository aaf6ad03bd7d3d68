use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};
use tracing::{info, warn};
use url::Url;

use crate::{
    domain::{AppError, DownloadOutcome, DownloadPlan, DownloadRequest},
    logbook::{self, LogEntry},
    utils,
    ytdlp::{self, ProgressLine, YtDlp},
};

/// Events streamed back to the UI, in emission order.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Metadata probe finished, the output filename is committed.
    Resolved { title: String },
    /// Fetch progress, 0.0..=1.0, plus the reported rate when present.
    Progress { percent: f32, speed: Option<String> },
    /// ffmpeg is extracting and encoding the audio.
    Converting,
    Completed(DownloadOutcome),
    Failed(AppError),
}

/// Runs one download end to end and owns the gate that keeps it to one
/// at a time.
#[derive(Clone)]
pub struct DownloadCoordinator {
    client: YtDlp,
    in_flight: Arc<AtomicBool>,
}

impl DownloadCoordinator {
    pub fn new(client: YtDlp) -> Self {
        Self {
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validate the request and claim the single download slot. The
    /// returned stream frees the slot when it finishes or is dropped;
    /// dropping it mid-flight also kills the child process.
    pub fn begin(
        &self,
        request: DownloadRequest,
    ) -> Result<BoxStream<'static, DownloadEvent>, AppError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::DownloadInProgress);
        }
        let claim = FlightClaim(Arc::clone(&self.in_flight));

        validate_request(&request)?;

        info!(url = %request.url, bitrate = request.bitrate.kbps(), "starting download");
        Ok(run(self.client.clone(), request, claim))
    }
}

/// Frees the download slot when dropped, wherever the run ends.
struct FlightClaim(Arc<AtomicBool>);

impl Drop for FlightClaim {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn validate_request(request: &DownloadRequest) -> Result<(), AppError> {
    utils::ensure_writable_dir(&request.dest_dir)?;

    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidUrl);
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::InvalidUrl),
    }
}

/// Internal state for the download stream
enum RunState {
    Inspect {
        client: YtDlp,
        request: DownloadRequest,
        claim: FlightClaim,
    },
    Launch {
        client: YtDlp,
        request: DownloadRequest,
        plan: DownloadPlan,
        claim: FlightClaim,
    },
    Streaming {
        child: Child,
        lines: Lines<BufReader<ChildStdout>>,
        request: DownloadRequest,
        plan: DownloadPlan,
        converting: bool,
        claim: FlightClaim,
    },
    Finished,
}

fn run(
    client: YtDlp,
    request: DownloadRequest,
    claim: FlightClaim,
) -> BoxStream<'static, DownloadEvent> {
    futures::stream::unfold(
        RunState::Inspect {
            client,
            request,
            claim,
        },
        |state| async move {
            match state {
                RunState::Inspect {
                    client,
                    request,
                    claim,
                } => match client.inspect(&request.url).await {
                    Ok(track) => {
                        let stem = utils::sanitize_title(&track.title);
                        let target = utils::unique_destination(&request.dest_dir, &stem);
                        let plan = DownloadPlan {
                            title: track.title,
                            target,
                        };
                        Some((
                            DownloadEvent::Resolved {
                                title: plan.title.clone(),
                            },
                            RunState::Launch {
                                client,
                                request,
                                plan,
                                claim,
                            },
                        ))
                    }
                    Err(e) => Some((DownloadEvent::Failed(e), RunState::Finished)),
                },
                RunState::Launch {
                    client,
                    request,
                    plan,
                    claim,
                } => {
                    let args = YtDlp::download_args(&request, &plan.target);
                    let mut child = match client.spawn_download(&args) {
                        Ok(child) => child,
                        Err(e) => return Some((DownloadEvent::Failed(e), RunState::Finished)),
                    };

                    match child.stdout.take() {
                        Some(stdout) => Some((
                            DownloadEvent::Progress {
                                percent: 0.0,
                                speed: None,
                            },
                            RunState::Streaming {
                                child,
                                lines: BufReader::new(stdout).lines(),
                                request,
                                plan,
                                converting: false,
                                claim,
                            },
                        )),
                        None => Some((
                            DownloadEvent::Failed(AppError::DownloadFailed(
                                "child stdout unavailable".to_string(),
                            )),
                            RunState::Finished,
                        )),
                    }
                }
                RunState::Streaming {
                    child,
                    mut lines,
                    request,
                    plan,
                    mut converting,
                    claim,
                } => loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => match ytdlp::parse_line(&line) {
                            ProgressLine::Fetching { percent, speed } if !converting => {
                                return Some((
                                    DownloadEvent::Progress { percent, speed },
                                    RunState::Streaming {
                                        child,
                                        lines,
                                        request,
                                        plan,
                                        converting,
                                        claim,
                                    },
                                ));
                            }
                            ProgressLine::Converting if !converting => {
                                converting = true;
                                return Some((
                                    DownloadEvent::Converting,
                                    RunState::Streaming {
                                        child,
                                        lines,
                                        request,
                                        plan,
                                        converting,
                                        claim,
                                    },
                                ));
                            }
                            _ => continue,
                        },
                        Ok(None) => {
                            return Some((finish(child, request, plan).await, RunState::Finished));
                        }
                        Err(e) => {
                            return Some((
                                DownloadEvent::Failed(AppError::DownloadFailed(e.to_string())),
                                RunState::Finished,
                            ));
                        }
                    }
                },
                RunState::Finished => None,
            }
        },
    )
    .boxed()
}

/// Collect the exit status and stderr, then log the download on success.
async fn finish(child: Child, request: DownloadRequest, plan: DownloadPlan) -> DownloadEvent {
    let output = match child.wait_with_output().await {
        Ok(output) => output,
        Err(e) => return DownloadEvent::Failed(AppError::DownloadFailed(e.to_string())),
    };

    if !output.status.success() {
        let err = ytdlp::classify_failure(&String::from_utf8_lossy(&output.stderr));
        warn!(error = %err, "yt-dlp exited with failure");
        return DownloadEvent::Failed(err);
    }

    if !plan.target.exists() {
        return DownloadEvent::Failed(AppError::DownloadFailed(format!(
            "expected output file is missing: {}",
            plan.target.display()
        )));
    }

    let entry = LogEntry {
        title: plan.title.clone(),
        bitrate: request.bitrate,
        path: plan.target.clone(),
    };
    let log_error = match logbook::append(&entry).await {
        Ok(()) => None,
        Err(e) => {
            warn!(error = %e, "could not append to download log");
            Some(e.to_string())
        }
    };

    info!(file = %plan.target.display(), "download finished");
    DownloadEvent::Completed(DownloadOutcome {
        title: plan.title,
        file: plan.target,
        bitrate: request.bitrate,
        log_error,
    })
}
