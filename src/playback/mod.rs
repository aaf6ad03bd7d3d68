use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use crate::domain::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Playback capability, resolved once at startup. Without an audio device
/// every control reports `Playback` instead of touching a sink, and the UI
/// swaps the player row for a note.
pub enum AudioOutput {
    Available(Player),
    Unavailable(String),
}

impl AudioOutput {
    pub fn detect() -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                debug!("audio output opened");
                AudioOutput::Available(Player::new(stream, handle))
            }
            Err(e) => {
                warn!(error = %e, "audio playback unavailable");
                AudioOutput::Unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AudioOutput::Available(_))
    }

    pub fn state(&self) -> PlaybackState {
        match self {
            AudioOutput::Available(player) => player.state(),
            AudioOutput::Unavailable(_) => PlaybackState::Idle,
        }
    }

    pub fn volume(&self) -> f32 {
        match self {
            AudioOutput::Available(player) => player.volume(),
            AudioOutput::Unavailable(_) => DEFAULT_VOLUME,
        }
    }

    pub fn play(&mut self, path: &Path) -> Result<(), AppError> {
        match self {
            AudioOutput::Available(player) => player.play(path),
            AudioOutput::Unavailable(reason) => Err(unavailable(reason)),
        }
    }

    pub fn pause(&mut self) -> Result<(), AppError> {
        match self {
            AudioOutput::Available(player) => {
                player.pause();
                Ok(())
            }
            AudioOutput::Unavailable(reason) => Err(unavailable(reason)),
        }
    }

    pub fn stop(&mut self) -> Result<(), AppError> {
        match self {
            AudioOutput::Available(player) => {
                player.stop();
                Ok(())
            }
            AudioOutput::Unavailable(reason) => Err(unavailable(reason)),
        }
    }

    pub fn set_volume(&mut self, level: f32) -> Result<(), AppError> {
        match self {
            AudioOutput::Available(player) => {
                player.set_volume(level);
                Ok(())
            }
            AudioOutput::Unavailable(reason) => Err(unavailable(reason)),
        }
    }

    /// Polled while playing; flips back to idle once the sink has drained.
    pub fn finished(&mut self) -> bool {
        match self {
            AudioOutput::Available(player) => player.poll_finished(),
            AudioOutput::Unavailable(_) => false,
        }
    }
}

fn unavailable(reason: &str) -> AppError {
    AppError::Playback(format!("audio playback unavailable: {}", reason))
}

const DEFAULT_VOLUME: f32 = 0.5;

/// Local MP3 player on top of a rodio sink. One file at a time.
pub struct Player {
    // keeps the device alive, dropping it silences the sink
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    loaded: Option<PathBuf>,
    state: PlaybackState,
    volume: f32,
}

impl Player {
    fn new(stream: OutputStream, handle: OutputStreamHandle) -> Self {
        Self {
            _stream: stream,
            handle,
            sink: None,
            loaded: None,
            state: PlaybackState::Idle,
            volume: DEFAULT_VOLUME,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Paused on the same file resumes; anything else decodes fresh from
    /// the start.
    pub fn play(&mut self, path: &Path) -> Result<(), AppError> {
        if self.state == PlaybackState::Paused && self.loaded.as_deref() == Some(path) {
            if let Some(sink) = &self.sink {
                sink.play();
                self.state = PlaybackState::Playing;
                return Ok(());
            }
        }

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let file = File::open(path)
            .map_err(|e| AppError::Playback(format!("cannot open {}: {}", path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| AppError::Playback(format!("cannot decode {}: {}", path.display(), e)))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| AppError::Playback(e.to_string()))?;
        sink.set_volume(self.volume);
        sink.append(source);

        self.sink = Some(sink);
        self.loaded = Some(path.to_path_buf());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.state = PlaybackState::Paused;
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.loaded = None;
        self.state = PlaybackState::Idle;
    }

    pub fn set_volume(&mut self, level: f32) {
        self.volume = level.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn poll_finished(&mut self) -> bool {
        if self.state == PlaybackState::Playing {
            if let Some(sink) = &self.sink {
                if sink.empty() {
                    self.sink = None;
                    self.loaded = None;
                    self.state = PlaybackState::Idle;
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_output_reports_every_control() {
        let mut output = AudioOutput::Unavailable("no device".to_string());
        assert!(!output.is_available());
        assert_eq!(output.state(), PlaybackState::Idle);

        assert!(matches!(
            output.play(Path::new("song.mp3")),
            Err(AppError::Playback(_))
        ));
        assert!(matches!(output.pause(), Err(AppError::Playback(_))));
        assert!(matches!(output.stop(), Err(AppError::Playback(_))));
        assert!(matches!(output.set_volume(0.2), Err(AppError::Playback(_))));

        assert!(!output.finished());
        assert_eq!(output.state(), PlaybackState::Idle);
    }

    #[test]
    fn unavailable_volume_is_default() {
        let output = AudioOutput::Unavailable("no device".to_string());
        assert_eq!(output.volume(), DEFAULT_VOLUME);
    }
}
