pub mod descriptor;
pub mod error;
pub mod extractor;

pub use descriptor::{format_duration, VideoDescriptor};
pub use error::YtDlpError;
pub use extractor::{
    DownloadRequest, Downloader, Extractor, RawVideo, Resolution, ResolveOptions, YtDlp,
};
