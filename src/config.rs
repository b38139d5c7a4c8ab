// Application settings
// Loaded from <config dir>/tubefetch/config.json when present, then
// overridden from the environment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::worker::{DownloadSettings, FetchSettings};

pub const APP_NAME: &str = "tubefetch";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub download_dir: PathBuf,
    pub background_video: PathBuf,
    pub max_height: u32,
    pub playlist_limit: usize,
    pub shallow_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    /// Initial background volume, 0.0 to 1.0.
    pub volume: f32,
    pub fps: u32,
    pub yt_dlp: String,
    pub ffmpeg: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            download_dir: PathBuf::from("downloads"),
            background_video: PathBuf::from("background.mp4"),
            max_height: 720,
            playlist_limit: 20,
            shallow_timeout_secs: 30,
            detail_timeout_secs: 15,
            volume: 0.5,
            fps: 60,
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl AppConfig {
    /// Default location of the config file, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.json"))
    }

    /// Reads the config file if it exists and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config.normalized())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("TUBEFETCH_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(video) = lookup("TUBEFETCH_BACKGROUND") {
            self.background_video = PathBuf::from(video);
        }
        if let Some(program) = lookup("TUBEFETCH_YT_DLP") {
            self.yt_dlp = program;
        }
        if let Some(program) = lookup("TUBEFETCH_FFMPEG") {
            self.ffmpeg = program;
        }
    }

    fn normalized(mut self) -> Self {
        self.volume = self.volume.clamp(0.0, 1.0);
        self.fps = self.fps.clamp(1, 240);
        self.playlist_limit = self.playlist_limit.max(1);
        self
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            playlist_limit: self.playlist_limit,
            shallow_timeout: Duration::from_secs(self.shallow_timeout_secs),
            detail_timeout: Duration::from_secs(self.detail_timeout_secs),
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            download_dir: self.download_dir.clone(),
            max_height: self.max_height,
        }
    }
}
