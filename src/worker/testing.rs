// Test doubles for the yt-dlp services

use std::sync::Mutex;
use std::time::Duration;

use crate::youtube::{
    DownloadRequest, Downloader, Extractor, RawVideo, Resolution, ResolveOptions, YtDlpError,
};

pub fn raw(id: &str, title: &str, duration: f64) -> RawVideo {
    RawVideo {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        duration: Some(duration),
        ..RawVideo::default()
    }
}

enum DetailMode {
    Empty,
    Fail,
    Fixed(RawVideo),
}

pub struct FakeExtractor {
    shallow: Result<Resolution, String>,
    detail: DetailMode,
    detail_calls: Mutex<Vec<(String, Duration)>>,
    delay: Duration,
}

impl FakeExtractor {
    fn new(shallow: Result<Resolution, String>) -> Self {
        FakeExtractor {
            shallow,
            detail: DetailMode::Empty,
            detail_calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn single(video: RawVideo) -> Self {
        Self::new(Ok(Resolution::Single(video)))
    }

    pub fn playlist(entries: Vec<RawVideo>) -> Self {
        Self::new(Ok(Resolution::Playlist(entries)))
    }

    pub fn failing(error: &str) -> Self {
        Self::new(Err(error.to_string()))
    }

    pub fn failing_details(mut self) -> Self {
        self.detail = DetailMode::Fail;
        self
    }

    pub fn with_detail(mut self, detail: RawVideo) -> Self {
        self.detail = DetailMode::Fixed(detail);
        self
    }

    /// Makes the shallow lookup block for `delay`.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn detail_calls(&self) -> Vec<String> {
        let calls = self.detail_calls.lock().unwrap();
        calls.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn detail_timeouts(&self) -> Vec<Duration> {
        let calls = self.detail_calls.lock().unwrap();
        calls.iter().map(|(_, timeout)| *timeout).collect()
    }
}

impl Extractor for FakeExtractor {
    fn resolve(&self, url: &str, options: ResolveOptions) -> Result<Resolution, YtDlpError> {
        if options.shallow {
            std::thread::sleep(self.delay);
            return self.shallow.clone().map_err(YtDlpError::Tool);
        }

        self.detail_calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.timeout));
        match &self.detail {
            DetailMode::Empty => Ok(Resolution::Single(RawVideo::default())),
            DetailMode::Fail => Err(YtDlpError::Tool("ERROR: detail lookup failed".into())),
            DetailMode::Fixed(video) => Ok(Resolution::Single(video.clone())),
        }
    }
}

type Hook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
pub struct FakeDownloader {
    requests: Mutex<Vec<(String, String, u32)>>,
    fail_at: Option<usize>,
    on_download: Option<Hook>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The download with this zero-based call index fails.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Runs `hook` with the call index while "downloading".
    pub fn on_download(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_download = Some(Box::new(hook));
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<(String, String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), YtDlpError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((
                request.url.to_string(),
                request.output_template.clone(),
                request.max_height,
            ));
            requests.len() - 1
        };

        if let Some(hook) = &self.on_download {
            hook(index);
        }

        if self.fail_at == Some(index) {
            return Err(YtDlpError::Tool("ERROR: HTTP Error 403: Forbidden".into()));
        }
        Ok(())
    }
}
