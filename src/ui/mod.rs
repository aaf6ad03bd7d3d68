use iced::{
    widget::{
        button, column, pick_list, progress_bar, row, slider, space, text, text_input,
        toggler, Space,
    },
    Color, Element, Length,
};

use crate::domain::{Bitrate, DownloadPhase, Settings, ThemeChoice};
use crate::playback::{AudioOutput, PlaybackState};

/// Main view state
pub struct HomeView {
    pub url: String,
    pub status_message: String,
    pub progress: f32,
    pub phase: DownloadPhase,
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            url: String::new(),
            status_message: "Paste a YouTube URL to begin".to_string(),
            progress: 0.0,
            phase: DownloadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum HomeMessage {
    UrlChanged(String),
    BitrateSelected(Bitrate),
    BrowseFolder,
    ThemeToggled(bool),
    DownloadPressed,
    PlayPressed,
    PausePressed,
    StopPressed,
    VolumeChanged(f32),
}

impl HomeView {
    pub fn update(&mut self, message: HomeMessage) {
        match message {
            HomeMessage::UrlChanged(url) => {
                self.url = url;
            }
            _ => {
                // Everything else is handled by the app
            }
        }
    }

    pub fn view<'a>(
        &'a self,
        settings: &'a Settings,
        missing_tool: Option<&'static str>,
        player: &'a AudioOutput,
    ) -> Element<'a, HomeMessage> {
        let header = row![
            text("TuneGrab").size(32),
            space::horizontal(),
            toggler(settings.theme() == ThemeChoice::Dark)
                .label("Dark theme")
                .on_toggle(HomeMessage::ThemeToggled),
        ]
        .align_y(iced::alignment::Vertical::Center);

        let folder = row![
            text(settings.output_dir().display().to_string()).size(14),
            space::horizontal(),
            button("Browse...")
                .on_press(HomeMessage::BrowseFolder)
                .padding([6, 12]),
        ]
        .spacing(8)
        .align_y(iced::alignment::Vertical::Center);

        let controls = row![
            text("Bitrate:").size(16),
            pick_list(
                Bitrate::ALL,
                Some(settings.bitrate()),
                HomeMessage::BitrateSelected
            ),
            space::horizontal(),
            button("Download MP3")
                .on_press(HomeMessage::DownloadPressed)
                .padding([10, 20]),
        ]
        .spacing(8)
        .align_y(iced::alignment::Vertical::Center);

        let mut screen = column![
            header,
            Space::new().height(Length::Fixed(10.0)),
            text("YouTube URL:").size(16),
            text_input("https://www.youtube.com/watch?v=...", &self.url)
                .on_input(HomeMessage::UrlChanged)
                .padding(10),
            text("Save to:").size(16),
            folder,
            controls,
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=1.0, self.progress),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(10.0)),
        ];

        if let Some(name) = missing_tool {
            screen = screen.push(
                text(format!(
                    "{} was not found on PATH. Install it to enable downloads.",
                    name
                ))
                .size(14)
                .style(|_| text::Style {
                    color: Some(Color::from_rgb(1.0, 0.6, 0.3)),
                    ..Default::default()
                }),
            );
        }

        screen = screen.push(self.player_row(settings, player));

        screen.padding(20).spacing(10).into()
    }

    fn player_row<'a>(
        &'a self,
        settings: &'a Settings,
        player: &'a AudioOutput,
    ) -> Element<'a, HomeMessage> {
        if !player.is_available() {
            return text("Audio playback is unavailable on this system")
                .size(13)
                .style(|_| text::Style {
                    color: Some(Color::from_rgb(0.6, 0.6, 0.6)),
                    ..Default::default()
                })
                .into();
        }

        let last = match settings.last_download() {
            Some(path) => format!("Last download: {}", path.display()),
            None => "No downloads yet this session".to_string(),
        };
        let play_label = if player.state() == PlaybackState::Paused {
            "Resume"
        } else {
            "Play"
        };

        column![
            text(last).size(13),
            row![
                button(play_label)
                    .on_press(HomeMessage::PlayPressed)
                    .padding([6, 12]),
                button("Pause")
                    .on_press(HomeMessage::PausePressed)
                    .padding([6, 12]),
                button("Stop")
                    .on_press(HomeMessage::StopPressed)
                    .padding([6, 12]),
                space::horizontal(),
                text("Volume").size(14),
                slider(0.0..=1.0, player.volume(), HomeMessage::VolumeChanged)
                    .step(0.01)
                    .width(Length::Fixed(140.0)),
            ]
            .spacing(8)
            .align_y(iced::alignment::Vertical::Center),
        ]
        .spacing(6)
        .into()
    }
}
