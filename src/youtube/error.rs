// Errors raised by the yt-dlp backed services and the rules that turn them
// into the status lines shown to the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum YtDlpError {
    #[error("Failed to run {program}: {source}. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// yt-dlp exited with a failure status; carries its stderr.
    #[error("{0}")]
    Tool(String),

    /// Killed after running past its wall-clock limit.
    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    #[error("Invalid JSON from yt-dlp: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected a single video but got a playlist")]
    UnexpectedPlaylist,
}

/// Coarse category of a resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Timeout,
    Unavailable,
    NotFound,
    Other,
}

// Checked in order against the lowercased error text; first match wins.
const RULES: &[(&str, ErrorCategory)] = &[
    ("timeout", ErrorCategory::Timeout),
    ("timed out", ErrorCategory::Timeout),
    ("unavailable", ErrorCategory::Unavailable),
    ("private video", ErrorCategory::Unavailable),
    ("not found", ErrorCategory::NotFound),
];

pub fn classify(text: &str) -> ErrorCategory {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Other)
}

/// Human readable status line for a failed shallow resolution.
pub fn describe_fetch_error(error: &YtDlpError) -> String {
    let text = error.to_string();
    match classify(&text) {
        ErrorCategory::Timeout => {
            "Error: Request timed out. Check your internet connection.".to_string()
        }
        ErrorCategory::Unavailable => "Error: Video is unavailable or private".to_string(),
        ErrorCategory::NotFound => "Error: Video or playlist not found".to_string(),
        ErrorCategory::Other => format!("Error: {}", text),
    }
}
