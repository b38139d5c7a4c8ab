// YouTube metadata extractor and downloader
// Uses the yt-dlp subprocess for both metadata resolution and downloads

use serde::Deserialize;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::error::YtDlpError;

/// One video record as reported by yt-dlp. Every field is optional because
/// flat playlist entries carry far less than a full extraction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawVideo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Single(RawVideo),
    /// Non-null entries in the order yt-dlp listed them.
    Playlist(Vec<RawVideo>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    /// Flat extraction: classify the URL without per-item detail.
    pub shallow: bool,
    pub timeout: Duration,
}

impl ResolveOptions {
    pub fn shallow(timeout: Duration) -> Self {
        ResolveOptions { shallow: true, timeout }
    }

    pub fn detailed(timeout: Duration) -> Self {
        ResolveOptions { shallow: false, timeout }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
    /// yt-dlp output template, e.g. `downloads/%(title)s.%(ext)s`
    pub output_template: String,
    pub max_height: u32,
}

pub trait Extractor: Send + Sync {
    fn resolve(&self, url: &str, options: ResolveOptions) -> Result<Resolution, YtDlpError>;

    /// Detailed resolution of a single item.
    fn resolve_video(&self, url: &str, timeout: Duration) -> Result<RawVideo, YtDlpError> {
        match self.resolve(url, ResolveOptions::detailed(timeout))? {
            Resolution::Single(video) => Ok(video),
            Resolution::Playlist(_) => Err(YtDlpError::UnexpectedPlaylist),
        }
    }
}

pub trait Downloader: Send + Sync {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), YtDlpError>;
}

pub struct YtDlp {
    program: String,
}

/// A resolution may make several requests, each bounded by the socket
/// timeout; the whole process gets this many times that.
const RESOLVE_LIMIT_FACTOR: u32 = 4;
const DOWNLOAD_LIMIT: Duration = Duration::from_secs(60 * 60);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        YtDlp {
            program: program.into(),
        }
    }

    /// Runs the program to completion and returns its stdout. The child is
    /// killed once `limit` has passed.
    fn run(&self, args: &[String], limit: Duration) -> Result<Vec<u8>, YtDlpError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        // Drained on their own threads so a full pipe cannot stall the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + limit;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    tracing::error!(program = %self.program, ?limit, "timed out, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(YtDlpError::TimedOut {
                        program: self.program.clone(),
                        secs: limit.as_secs(),
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(self.spawn_error(source));
                }
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            let error = String::from_utf8_lossy(&stderr).trim().to_string();
            tracing::debug!(program = %self.program, %error, "yt-dlp failed");
            let error = if error.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                error
            };
            return Err(YtDlpError::Tool(error));
        }

        Ok(stdout)
    }

    fn spawn_error(&self, source: std::io::Error) -> YtDlpError {
        YtDlpError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

type Reader = Option<JoinHandle<Vec<u8>>>;

fn drain(pipe: Option<impl Read + Send + 'static>) -> Reader {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            bytes
        })
    })
}

fn collect(reader: Reader) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Arguments for `yt-dlp -J`. Shallow lookups list playlist entries without
/// visiting them; detailed lookups never expand a playlist.
pub fn resolve_args(url: &str, options: &ResolveOptions) -> Vec<String> {
    let mode = if options.shallow {
        "--flat-playlist"
    } else {
        "--no-playlist"
    };

    vec![
        "-J".to_string(),
        "--no-warnings".to_string(),
        "--socket-timeout".to_string(),
        options.timeout.as_secs().max(1).to_string(),
        mode.to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

pub fn download_args(request: &DownloadRequest<'_>) -> Vec<String> {
    vec![
        "-f".to_string(),
        format!("best[height<={}]", request.max_height),
        "-o".to_string(),
        request.output_template.clone(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "--no-playlist".to_string(),
        "--".to_string(),
        request.url.to_string(),
    ]
}

impl Extractor for YtDlp {
    fn resolve(&self, url: &str, options: ResolveOptions) -> Result<Resolution, YtDlpError> {
        let limit = options.timeout.max(Duration::from_secs(1)) * RESOLVE_LIMIT_FACTOR;
        let stdout = self.run(&resolve_args(url, &options), limit)?;
        parse_resolution(&stdout)
    }
}

impl Downloader for YtDlp {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), YtDlpError> {
        self.run(&download_args(request), DOWNLOAD_LIMIT).map(|_| ())
    }
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(flatten)]
    video: RawVideo,
    #[serde(default)]
    entries: Option<Vec<Option<RawVideo>>>,
}

/// Parses `yt-dlp -J` output. A non-empty `entries` array marks a playlist.
pub fn parse_resolution(json: &[u8]) -> Result<Resolution, YtDlpError> {
    let info: RawInfo = serde_json::from_slice(json)?;

    match info.entries {
        Some(entries) if !entries.is_empty() => {
            Ok(Resolution::Playlist(entries.into_iter().flatten().collect()))
        }
        _ => Ok(Resolution::Single(info.video)),
    }
}
