// Metadata fetch worker
// Resolves a URL into the video list, reporting progress on the channel

use std::collections::HashSet;
use std::time::Duration;

use super::cancel::CancelSignal;
use super::channel::{Message, MessageSender};
use crate::youtube::descriptor::{format_duration, whole_seconds};
use crate::youtube::error::{describe_fetch_error, YtDlpError};
use crate::youtube::{Extractor, RawVideo, Resolution, ResolveOptions, VideoDescriptor};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchSettings {
    /// Playlist entries beyond this are dropped.
    pub playlist_limit: usize,
    pub shallow_timeout: Duration,
    pub detail_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            playlist_limit: 20,
            shallow_timeout: Duration::from_secs(30),
            detail_timeout: Duration::from_secs(15),
        }
    }
}

/// Worker body. Every outcome ends as messages on `tx`; either one complete
/// `Result` is posted or none at all.
///
/// `shutdown` is only set when the application exits; it is checked between
/// playlist items.
pub fn fetch_videos(
    extractor: &dyn Extractor,
    url: &str,
    settings: &FetchSettings,
    tx: &MessageSender,
    shutdown: &CancelSignal,
) {
    tx.status("Fetching video information...");

    let options = ResolveOptions::shallow(settings.shallow_timeout);
    let resolution = match extractor.resolve(url, options) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(%url, error = %e, "shallow resolution failed");
            tx.status(describe_fetch_error(&e));
            return;
        }
    };

    let videos = match resolution {
        Resolution::Playlist(entries) => {
            match resolve_playlist(extractor, entries, settings, tx, shutdown) {
                Some(videos) => videos,
                None => {
                    tracing::info!(%url, "fetch abandoned on shutdown");
                    return;
                }
            }
        }
        Resolution::Single(shallow) => {
            tx.status("Getting video details...");
            // Single videos get the longer timeout.
            let detail = extractor.resolve_video(url, settings.shallow_timeout);
            if let Err(e) = &detail {
                tracing::debug!(%url, error = %e, "detail lookup failed, using flat data");
            }
            vec![merge_single(url, &shallow, detail.as_ref().ok())]
        }
    };

    let count = videos.len();
    tracing::info!(%url, count, "fetch complete");
    tx.send(Message::Result(videos));
    tx.status(format!("Successfully loaded {} video(s)", count));
}

fn resolve_playlist(
    extractor: &dyn Extractor,
    entries: Vec<RawVideo>,
    settings: &FetchSettings,
    tx: &MessageSender,
    shutdown: &CancelSignal,
) -> Option<Vec<VideoDescriptor>> {
    let entries = playlist_candidates(entries, settings.playlist_limit);
    let total = entries.len();
    tx.status(format!(
        "Found playlist with {} videos. Getting details...",
        total
    ));

    let mut videos = Vec::with_capacity(total);
    for (index, entry) in entries.iter().enumerate() {
        if shutdown.is_set() {
            return None;
        }
        tx.status(format!("Processing video {}/{}...", index + 1, total));

        let url = entry_url(index, entry);
        let detail: Result<RawVideo, YtDlpError> =
            extractor.resolve_video(&url, settings.detail_timeout);
        if let Err(e) = &detail {
            tracing::debug!(%url, error = %e, "detail lookup failed, using flat data");
        }
        videos.push(merge_entry(index, entry, detail.as_ref().ok()));
    }

    Some(videos)
}

/// First `limit` entries in playlist order, skipping repeated ids.
fn playlist_candidates(entries: Vec<RawVideo>, limit: usize) -> Vec<RawVideo> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| match text(&entry.id) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .take(limit)
        .collect()
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn seconds(value: Option<f64>) -> Option<f64> {
    value.filter(|d| *d > 0.0)
}

fn entry_id(index: usize, entry: &RawVideo) -> String {
    text(&entry.id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("unknown_{}", index))
}

fn entry_url(index: usize, entry: &RawVideo) -> String {
    text(&entry.url)
        .or_else(|| text(&entry.webpage_url))
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("https://www.youtube.com/watch?v={}", entry_id(index, entry))
        })
}

fn uploader_of(detail: Option<&RawVideo>, shallow: &RawVideo) -> String {
    detail
        .and_then(|d| text(&d.uploader).or_else(|| text(&d.channel)))
        .or_else(|| text(&shallow.uploader))
        .unwrap_or("Unknown Channel")
        .to_string()
}

fn duration_of(detail: Option<&RawVideo>, shallow: &RawVideo) -> String {
    let secs = detail
        .and_then(|d| seconds(d.duration))
        .or_else(|| seconds(shallow.duration))
        .map(whole_seconds)
        .unwrap_or(0);
    format_duration(secs)
}

/// Combines a flat playlist entry with its detailed lookup, if one succeeded.
pub fn merge_entry(index: usize, entry: &RawVideo, detail: Option<&RawVideo>) -> VideoDescriptor {
    VideoDescriptor {
        id: entry_id(index, entry),
        title: detail
            .and_then(|d| text(&d.title))
            .or_else(|| text(&entry.title))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Video {}", index + 1)),
        duration: duration_of(detail, entry),
        uploader: uploader_of(detail, entry),
        url: entry_url(index, entry),
        thumbnail: text(&entry.thumbnail).unwrap_or_default().to_string(),
        selected: false,
    }
}

/// Combines the shallow record of a single video with its detailed lookup.
pub fn merge_single(url: &str, shallow: &RawVideo, detail: Option<&RawVideo>) -> VideoDescriptor {
    VideoDescriptor {
        id: detail
            .and_then(|d| text(&d.id))
            .or_else(|| text(&shallow.id))
            .unwrap_or("unknown")
            .to_string(),
        title: detail
            .and_then(|d| text(&d.title))
            .or_else(|| text(&shallow.title))
            .unwrap_or("Untitled Video")
            .to_string(),
        duration: duration_of(detail, shallow),
        uploader: uploader_of(detail, shallow),
        url: url.to_string(),
        thumbnail: detail
            .and_then(|d| text(&d.thumbnail))
            .or_else(|| text(&shallow.thumbnail))
            .unwrap_or_default()
            .to_string(),
        selected: false,
    }
}
