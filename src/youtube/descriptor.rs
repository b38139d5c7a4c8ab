// Resolved video candidates as shown in the list and handed to the downloader

/// One fetched video. Only `selected` changes after a fetch delivers it.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDescriptor {
    pub id: String,
    pub title: String,
    /// Already formatted, see [`format_duration`].
    pub duration: String,
    pub uploader: String,
    pub url: String,
    /// Empty when the extractor did not report one.
    pub thumbnail: String,
    pub selected: bool,
}

/// Formats seconds as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// yt-dlp reports fractional seconds; negative or NaN values count as zero.
pub fn whole_seconds(duration: f64) -> u64 {
    if duration.is_finite() && duration > 0.0 {
        duration as u64
    } else {
        0
    }
}

/// Cuts `text` to at most `max` characters, marking the cut with "...".
pub fn truncate_title(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    cut
}
