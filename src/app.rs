use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use iced::{Subscription, Task, Theme};

use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::domain::{AppError, DownloadPhase, DownloadRequest, Settings, ThemeChoice};
use crate::playback::{AudioOutput, PlaybackState};
use crate::ui::{HomeMessage, HomeView};
use crate::ytdlp::{ToolingReport, YtDlp};

pub struct TuneGrabApp {
    view: HomeView,
    settings: Settings,
    coordinator: DownloadCoordinator,
    player: AudioOutput,
    // None until the startup probe answers
    tools: Option<ToolingReport>,
}

impl Default for TuneGrabApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TuneGrabApp {
    pub fn new() -> Self {
        Self::with_client(YtDlp::default())
    }

    fn with_client(client: YtDlp) -> Self {
        Self {
            view: HomeView::default(),
            settings: Settings::default(),
            coordinator: DownloadCoordinator::new(client),
            player: AudioOutput::detect(),
            tools: None,
        }
    }

    fn missing_tool(&self) -> Option<&'static str> {
        self.tools.as_ref().and_then(|report| report.missing())
    }
}

/// Initial state plus the startup probe for yt-dlp and ffmpeg.
pub fn boot() -> (TuneGrabApp, Task<Message>) {
    let client = YtDlp::default();
    let probe = client.clone();
    let app = TuneGrabApp::with_client(client);
    let task = Task::perform(
        async move { probe.probe_tools().await },
        Message::ToolsProbed,
    );
    (app, task)
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(HomeMessage),
    ToolsProbed(ToolingReport),
    /// Folder picked in the browse dialog, `None` on cancel
    FolderSelected(Option<PathBuf>),
    /// Next event from the running download stream
    Download(DownloadEvent),
    /// Periodic poll while audio is playing
    PlaybackTick,
}

pub fn update(app: &mut TuneGrabApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                HomeMessage::UrlChanged(_) => {}
                HomeMessage::BitrateSelected(bitrate) => {
                    app.settings.set_bitrate(bitrate);
                }
                HomeMessage::ThemeToggled(dark) => {
                    app.settings.set_theme(if dark {
                        ThemeChoice::Dark
                    } else {
                        ThemeChoice::Light
                    });
                }
                HomeMessage::BrowseFolder => {
                    let start = app.settings.output_dir().to_path_buf();
                    return Task::perform(
                        async move {
                            rfd::AsyncFileDialog::new()
                                .set_directory(&start)
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                HomeMessage::DownloadPressed => {
                    if let Some(name) = app.missing_tool() {
                        app.view.status_message = AppError::MissingDependency(name).to_string();
                        return Task::none();
                    }

                    let request = DownloadRequest {
                        url: app.view.url.trim().to_string(),
                        dest_dir: app.settings.output_dir().to_path_buf(),
                        bitrate: app.settings.bitrate(),
                    };

                    match app.coordinator.begin(request) {
                        Ok(events) => {
                            app.view.phase = DownloadPhase::Inspecting;
                            app.view.progress = 0.0;
                            app.view.status_message = "Fetching video info...".to_string();
                            return Task::stream(events.map(Message::Download));
                        }
                        Err(e) => {
                            app.view.status_message = e.to_string();
                        }
                    }
                }
                HomeMessage::PlayPressed => {
                    match app.settings.last_download().map(|p| p.to_path_buf()) {
                        None => {
                            app.view.status_message = AppError::NoFileSelected.to_string();
                        }
                        Some(path) => match app.player.play(&path) {
                            Ok(()) => {
                                let name = path
                                    .file_name()
                                    .map(|n| n.to_string_lossy().into_owned())
                                    .unwrap_or_default();
                                app.view.status_message = format!("Playing: {}", name);
                            }
                            Err(e) => {
                                app.view.status_message = e.to_string();
                            }
                        },
                    }
                }
                HomeMessage::PausePressed => match app.player.pause() {
                    Ok(()) => {
                        if app.player.state() == PlaybackState::Paused {
                            app.view.status_message = "Paused".to_string();
                        }
                    }
                    Err(e) => {
                        app.view.status_message = e.to_string();
                    }
                },
                HomeMessage::StopPressed => match app.player.stop() {
                    Ok(()) => {
                        app.view.status_message = "Playback stopped".to_string();
                    }
                    Err(e) => {
                        app.view.status_message = e.to_string();
                    }
                },
                HomeMessage::VolumeChanged(level) => {
                    if let Err(e) = app.player.set_volume(level) {
                        app.view.status_message = e.to_string();
                    }
                }
            }
        }
        Message::ToolsProbed(report) => {
            if let Some(name) = report.missing() {
                app.view.status_message = AppError::MissingDependency(name).to_string();
            }
            app.tools = Some(report);
        }
        Message::FolderSelected(choice) => {
            if let Some(dir) = choice {
                if let Err(e) = app.settings.set_output_dir(dir) {
                    app.view.status_message = e.to_string();
                }
            }
        }
        Message::Download(event) => match event {
            DownloadEvent::Resolved { title } => {
                app.view.status_message = format!("Found: {}", title);
            }
            DownloadEvent::Progress { percent, speed } => {
                app.view.phase = DownloadPhase::Fetching;
                app.view.progress = percent;
                app.view.status_message = match speed {
                    Some(speed) => format!("Downloading: {:.1}% ({})", percent * 100.0, speed),
                    None => format!("Downloading: {:.1}%", percent * 100.0),
                };
            }
            DownloadEvent::Converting => {
                app.view.phase = DownloadPhase::Converting;
                app.view.progress = 1.0;
                app.view.status_message = "Converting to MP3...".to_string();
            }
            DownloadEvent::Completed(outcome) => {
                app.view.phase = DownloadPhase::Done;
                app.view.progress = 1.0;
                app.settings.record_download(outcome.file.clone());
                app.view.status_message = match &outcome.log_error {
                    Some(log_error) => {
                        format!("Saved: {} ({})", outcome.file.display(), log_error)
                    }
                    None => format!("Saved: {}", outcome.file.display()),
                };
            }
            DownloadEvent::Failed(e) => {
                app.view.phase = DownloadPhase::Failed;
                app.view.progress = 0.0;
                app.view.status_message = e.to_string();
            }
        },
        Message::PlaybackTick => {
            if app.player.finished() {
                app.view.status_message = "Playback finished".to_string();
            }
        }
    }

    Task::none()
}

pub fn view(app: &TuneGrabApp) -> iced::Element<'_, Message> {
    app.view
        .view(&app.settings, app.missing_tool(), &app.player)
        .map(Message::UiMessage)
}

pub fn theme(app: &TuneGrabApp) -> Theme {
    match app.settings.theme() {
        ThemeChoice::Light => Theme::Light,
        ThemeChoice::Dark => Theme::Dark,
    }
}

/// Drives the end-of-playback poll; idle unless something is playing.
pub fn subscription(app: &TuneGrabApp) -> Subscription<Message> {
    if app.player.state() == PlaybackState::Playing {
        iced::time::every(Duration::from_millis(500)).map(|_| Message::PlaybackTick)
    } else {
        Subscription::none()
    }
}
