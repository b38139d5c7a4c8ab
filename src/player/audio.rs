// ==========================================
// BACKGROUND AUDIO LOOP
// ==========================================
// Plays the soundtrack of the background video on an endless loop using
// rodio. It handles:
// - Connecting to the default audio output device
// - Extracting the audio track once (ffmpeg -> WAV held in memory)
// - Looping, pausing, resuming and volume control
//
// Extraction runs on its own thread so the UI loop never waits on ffmpeg.

use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    Stopped, // Track not loaded yet
    Playing,
    Paused,
}

pub struct LoopingAudio {
    // The OutputStream is leaked on open so the device stays alive for the
    // whole program; only the sink is kept.
    sink: Option<Arc<Sink>>,
    state: PlayerState,
    volume: f32,
}

impl Drop for LoopingAudio {
    fn drop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }
}

impl LoopingAudio {
    // ==========================================
    // CONSTRUCTOR: open()
    // ==========================================
    // Asks the OS for the default output device. Without one (headless
    // machine, no sound server) the player still works, it just stays silent.
    pub fn open(volume: f32) -> Self {
        let sink = match OutputStream::try_default() {
            Ok((stream, handle)) => match Sink::try_new(&handle) {
                Ok(sink) => {
                    std::mem::forget(stream);
                    Some(Arc::new(sink))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not create audio sink");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "no audio output device, background will be silent");
                None
            }
        };

        let mut audio = LoopingAudio {
            sink,
            state: PlayerState::Stopped,
            volume: 1.0,
        };
        audio.set_volume(volume);
        audio
    }

    // ==========================================
    // PLAYBACK CONTROL: play()
    // ==========================================
    // First call starts the one-time extraction thread; later calls just
    // resume the sink. Appending to a paused sink keeps it paused, so a stop
    // issued while extraction is still running is honored.
    pub fn play(&mut self, media: &Path, ffmpeg: &str) {
        let Some(sink) = &self.sink else {
            return;
        };

        if self.state == PlayerState::Stopped {
            let sink = Arc::clone(sink);
            let media = media.to_path_buf();
            let ffmpeg = ffmpeg.to_string();

            let spawned = std::thread::Builder::new()
                .name("background-audio".into())
                .spawn(move || match load_track(&ffmpeg, &media) {
                    Ok(track) => {
                        sink.append(track.repeat_infinite());
                        tracing::info!(media = %media.display(), "background audio looping");
                    }
                    Err(e) => tracing::warn!(
                        media = %media.display(),
                        error = %e,
                        "background audio unavailable"
                    ),
                });

            if let Err(e) = spawned {
                tracing::error!(error = %e, "failed to spawn audio thread");
                self.state = PlayerState::Stopped;
                return;
            }
        }

        sink.play();
        self.state = PlayerState::Playing;
    }

    pub fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    /// 0.0 (mute) to 1.0 (full); out of range values are clamped.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state.clone()
    }
}

// Runs ffmpeg once to pull the soundtrack into a temporary WAV file, keeps
// the bytes in memory and deletes the file right away.
fn load_track(ffmpeg: &str, media: &Path) -> Result<Decoder<Cursor<Vec<u8>>>, String> {
    let wav = temp_wav_path();

    let output = Command::new(ffmpeg)
        .args(["-loglevel", "error", "-nostdin", "-y", "-i"])
        .arg(media)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"])
        .arg(&wav)
        .output()
        .map_err(|e| format!("Failed to run {}: {}", ffmpeg, e))?;

    if !output.status.success() {
        let _ = std::fs::remove_file(&wav);
        return Err(format!(
            "ffmpeg audio extraction failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let bytes = std::fs::read(&wav).map_err(|e| format!("Failed to read extracted audio: {}", e));
    let _ = std::fs::remove_file(&wav);

    Decoder::new(Cursor::new(bytes?)).map_err(|e| format!("Audio decode failed: {}", e))
}

fn temp_wav_path() -> PathBuf {
    std::env::temp_dir().join(format!("tubefetch-background-{}.wav", std::process::id()))
}
