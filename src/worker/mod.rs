// Background workers and the plumbing they share with the UI loop:
// the message channel, the cancel flag and per-kind worker slots.

pub mod cancel;
pub mod channel;
pub mod download;
pub mod fetch;
pub mod slot;

#[cfg(test)]
pub mod testing;

pub use cancel::CancelSignal;
pub use channel::{channel, Message, MessageReceiver, MessageSender};
pub use download::{download_videos, DownloadSettings};
pub use fetch::{fetch_videos, FetchSettings};
pub use slot::{WorkerSlot, WorkerState};
