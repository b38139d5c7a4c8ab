// Message channel from background workers to the UI loop

use tokio::sync::mpsc;

use crate::youtube::VideoDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Replaces the status line.
    Status(String),
    /// Replaces the progress line; an empty string clears it.
    Progress(String),
    /// Replaces the whole video list.
    Result(Vec<VideoDescriptor>),
}

/// Cloneable producer half, one per worker.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl MessageSender {
    pub fn send(&self, message: Message) {
        // The receiver only goes away on shutdown, nothing left to tell.
        let _ = self.tx.send(message);
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(Message::Status(text.into()));
    }

    pub fn progress(&self, text: impl Into<String>) {
        self.send(Message::Progress(text.into()));
    }
}

/// Consumer half, owned by the UI loop.
#[derive(Debug)]
pub struct MessageReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl MessageReceiver {
    /// Everything posted since the last drain, oldest first. Never blocks.
    pub fn drain_all(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub fn channel() -> (MessageSender, MessageReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageSender { tx }, MessageReceiver { rx })
}
