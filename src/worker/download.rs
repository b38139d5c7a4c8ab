// Download worker
// Downloads the selected videos one after another, checking the cancel flag
// between items

use std::path::{Path, PathBuf};

use super::cancel::CancelSignal;
use super::channel::MessageSender;
use crate::youtube::{DownloadRequest, Downloader, VideoDescriptor};

const PROGRESS_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub download_dir: PathBuf,
    /// Highest vertical resolution to fetch.
    pub max_height: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        DownloadSettings {
            download_dir: PathBuf::from("downloads"),
            max_height: 720,
        }
    }
}

enum BatchOutcome {
    Completed(usize),
    Cancelled,
}

/// yt-dlp output template naming files after the video title.
pub fn output_template(download_dir: &Path) -> String {
    download_dir
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .into_owned()
}

/// Worker body. `videos` is the full list; only selected items are fetched,
/// in list order. The cancel flag is checked before each item, never during
/// one.
pub fn download_videos(
    downloader: &dyn Downloader,
    videos: &[VideoDescriptor],
    settings: &DownloadSettings,
    tx: &MessageSender,
    cancel: &CancelSignal,
) {
    let selected: Vec<&VideoDescriptor> = videos.iter().filter(|v| v.selected).collect();
    if selected.is_empty() {
        tx.status("No videos selected");
        return;
    }

    match run_batch(downloader, &selected, settings, tx, cancel) {
        Ok(BatchOutcome::Completed(count)) => {
            tracing::info!(count, "download batch complete");
            tx.status(format!("Successfully downloaded {} video(s)", count));
            tx.progress("");
        }
        Ok(BatchOutcome::Cancelled) => {
            tracing::info!("download batch cancelled");
            tx.status("Download cancelled");
        }
        Err(e) => {
            tracing::error!(error = %e, "download batch failed");
            tx.status(format!("Download error: {}", e));
            tx.progress("");
        }
    }
}

fn run_batch(
    downloader: &dyn Downloader,
    selected: &[&VideoDescriptor],
    settings: &DownloadSettings,
    tx: &MessageSender,
    cancel: &CancelSignal,
) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
    let total = selected.len();
    tx.status(format!("Downloading {} video(s)...", total));

    std::fs::create_dir_all(&settings.download_dir)?;
    let output_template = output_template(&settings.download_dir);

    for (index, video) in selected.iter().enumerate() {
        if cancel.is_set() {
            return Ok(BatchOutcome::Cancelled);
        }

        tx.progress(format!(
            "Downloading {}/{}: {}...",
            index + 1,
            total,
            video.title.chars().take(PROGRESS_TITLE_CHARS).collect::<String>()
        ));
        tracing::info!(id = %video.id, url = %video.url, "downloading");

        downloader.download(&DownloadRequest {
            url: &video.url,
            output_template: output_template.clone(),
            max_height: settings.max_height,
        })?;
    }

    Ok(BatchOutcome::Completed(total))
}
