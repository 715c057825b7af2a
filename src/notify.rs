use tokio::sync::broadcast;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Something an observer of a planning session may want to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Committed(Event),
    Rejected { op: &'static str, reason: String },
    Saved,
    SaveFailed { message: String },
}

/// Broadcast hub for one planning session.
pub struct NotifyHub {
    sender: broadcast::Sender<Notice>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Send a notice. No-op if nobody is listening.
    pub fn send(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }
}
