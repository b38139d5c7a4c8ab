// Background video decoding
// ffmpeg decodes the file at its native rate, looping forever, into raw RGB
// frames on a dedicated thread. The UI loop only ever reads the latest frame.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Decode resolution. Terminal cells are coarse, so this is plenty; frames
/// are rescaled to the display area on demand.
pub const DECODE_WIDTH: usize = 192;
pub const DECODE_HEIGHT: usize = 108;

/// Packed RGB24 image.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl VideoFrame {
    /// Returns `None` if `pixels` does not hold exactly `width * height` RGB
    /// triples.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width * height * 3).then_some(VideoFrame {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * self.width + x) * 3;
        (self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }

    /// Nearest-neighbour resize. A zero-sized target yields an empty frame.
    pub fn scaled(&self, width: usize, height: usize) -> VideoFrame {
        if width == 0 || height == 0 || self.width == 0 || self.height == 0 {
            return VideoFrame {
                width: 0,
                height: 0,
                pixels: Vec::new(),
            };
        }

        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let src_y = y * self.height / height;
            for x in 0..width {
                let src_x = x * self.width / width;
                let (r, g, b) = self.pixel(src_x, src_y);
                pixels.extend_from_slice(&[r, g, b]);
            }
        }

        VideoFrame {
            width,
            height,
            pixels,
        }
    }
}

type LatestFrame = Arc<Mutex<Option<Arc<VideoFrame>>>>;

/// A running ffmpeg decode loop. Dropping it stops ffmpeg and joins the
/// reader thread.
pub struct VideoLoop {
    stop: Arc<AtomicBool>,
    child: Arc<Mutex<Child>>,
    latest: LatestFrame,
    thread: Option<JoinHandle<()>>,
}

impl VideoLoop {
    pub fn spawn(ffmpeg: &str, media: &Path) -> std::io::Result<Self> {
        let mut child = Command::new(ffmpeg)
            .args(["-loglevel", "error", "-nostdin", "-re", "-stream_loop", "-1", "-i"])
            .arg(media)
            .arg("-an")
            .arg("-vf")
            .arg(format!("scale={}:{}", DECODE_WIDTH, DECODE_HEIGHT))
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "ffmpeg stdout was not captured")
        })?;

        let stop = Arc::new(AtomicBool::new(false));
        let latest: LatestFrame = Arc::new(Mutex::new(None));

        let thread = {
            let stop = Arc::clone(&stop);
            let latest = Arc::clone(&latest);
            std::thread::Builder::new()
                .name("background-video".into())
                .spawn(move || read_frames(stdout, &stop, &latest))
        };

        let child = Arc::new(Mutex::new(child));
        let thread = match thread {
            Ok(thread) => thread,
            Err(e) => {
                kill(&child);
                return Err(e);
            }
        };

        tracing::info!(media = %media.display(), "background video decoding");
        Ok(VideoLoop {
            stop,
            child,
            latest,
            thread: Some(thread),
        })
    }

    /// Most recently decoded frame, if any arrived yet.
    pub fn latest(&self) -> Option<Arc<VideoFrame>> {
        self.latest.lock().ok().and_then(|frame| frame.clone())
    }
}

impl Drop for VideoLoop {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Killing ffmpeg closes its stdout, which unblocks the reader.
        kill(&self.child);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        tracing::info!("background video stopped");
    }
}

fn kill(child: &Mutex<Child>) {
    if let Ok(mut child) = child.lock() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

fn read_frames(mut source: impl Read, stop: &AtomicBool, latest: &Mutex<Option<Arc<VideoFrame>>>) {
    let mut buffer = vec![0u8; DECODE_WIDTH * DECODE_HEIGHT * 3];

    while !stop.load(Ordering::SeqCst) {
        if let Err(e) = source.read_exact(&mut buffer) {
            if !stop.load(Ordering::SeqCst) {
                tracing::warn!(error = %e, "background video stream ended");
            }
            break;
        }

        if let Some(frame) = VideoFrame::new(DECODE_WIDTH, DECODE_HEIGHT, buffer.clone()) {
            if let Ok(mut slot) = latest.lock() {
                *slot = Some(Arc::new(frame));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> VideoFrame {
        // 2x2: red, green / blue, white
        VideoFrame::new(
            2,
            2,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        )
        .unwrap()
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        assert!(VideoFrame::new(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn upscale_repeats_source_pixels() {
        let frame = checker().scaled(4, 4);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.pixel(0, 0), (255, 0, 0));
        assert_eq!(frame.pixel(1, 1), (255, 0, 0));
        assert_eq!(frame.pixel(3, 0), (0, 255, 0));
        assert_eq!(frame.pixel(0, 3), (0, 0, 255));
        assert_eq!(frame.pixel(3, 3), (255, 255, 255));
    }

    #[test]
    fn zero_sized_target_is_empty() {
        let frame = checker().scaled(0, 10);
        assert_eq!((frame.width(), frame.height()), (0, 0));
    }

    #[test]
    fn reader_keeps_latest_frame_and_stops_at_eof() {
        let frame_len = DECODE_WIDTH * DECODE_HEIGHT * 3;
        let mut data = vec![1u8; frame_len];
        data.extend(vec![2u8; frame_len]);
        // A trailing partial frame is discarded.
        data.extend(vec![3u8; 10]);

        let stop = AtomicBool::new(false);
        let latest = Mutex::new(None);
        read_frames(std::io::Cursor::new(data), &stop, &latest);

        let frame = latest.lock().unwrap().clone().expect("a frame was stored");
        assert_eq!(frame.pixel(0, 0), (2, 2, 2));
    }

    #[test]
    fn reader_honours_stop_flag() {
        let stop = AtomicBool::new(true);
        let latest = Mutex::new(None);
        read_frames(std::io::Cursor::new(vec![0u8; 100]), &stop, &latest);
        assert!(latest.lock().unwrap().is_none());
    }
}
