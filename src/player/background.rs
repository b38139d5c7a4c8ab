// Looping video-with-audio background shown behind the UI

use std::path::PathBuf;

use super::audio::{LoopingAudio, PlayerState};
use super::video::{VideoFrame, VideoLoop};

pub struct BackgroundPlayer {
    media: PathBuf,
    ffmpeg: String,
    video: Option<VideoLoop>,
    // Opened on first start so a session that never plays the background
    // never touches the audio device.
    audio: Option<LoopingAudio>,
    volume: f32,
}

impl BackgroundPlayer {
    pub fn new(media: impl Into<PathBuf>, ffmpeg: impl Into<String>, volume: f32) -> Self {
        let media = media.into();
        if !media.exists() {
            tracing::info!(media = %media.display(), "no background video found");
        }

        BackgroundPlayer {
            media,
            ffmpeg: ffmpeg.into(),
            video: None,
            audio: None,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn is_available(&self) -> bool {
        self.media.exists()
    }

    pub fn is_playing(&self) -> bool {
        self.video.is_some()
    }

    /// Starts (or resumes) video and audio. Returns `false` when there is
    /// nothing to play.
    pub fn start(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }

        if self.video.is_none() {
            match VideoLoop::spawn(&self.ffmpeg, &self.media) {
                Ok(video) => self.video = Some(video),
                Err(e) => {
                    tracing::warn!(
                        ffmpeg = %self.ffmpeg,
                        error = %e,
                        "could not start background video"
                    );
                    return false;
                }
            }
        }

        let volume = self.volume;
        self.audio
            .get_or_insert_with(|| LoopingAudio::open(volume))
            .play(&self.media, &self.ffmpeg);
        true
    }

    pub fn stop(&mut self) {
        self.video = None;
        if let Some(audio) = self.audio.as_mut() {
            audio.pause();
        }
    }

    pub fn audio_state(&self) -> PlayerState {
        self.audio
            .as_ref()
            .map(LoopingAudio::state)
            .unwrap_or(PlayerState::Stopped)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(audio) = self.audio.as_mut() {
            audio.set_volume(self.volume);
        }
    }

    /// Latest decoded frame resized to `width` x `height` pixels, or `None`
    /// while stopped or before the first frame arrives.
    pub fn next_frame(&self, width: usize, height: usize) -> Option<VideoFrame> {
        let frame = self.video.as_ref()?.latest()?;
        Some(frame.scaled(width, height))
    }
}
