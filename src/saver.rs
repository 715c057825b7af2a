use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::model::WeekTemplate;
use crate::notify::{Notice, NotifyHub};
use crate::store::WeekStore;

pub(crate) enum SaveCommand {
    Save(Arc<WeekTemplate>),
    Flush { response: oneshot::Sender<()> },
}

/// Background task that owns the store and saves committed snapshots.
/// 1. Block until the first command arrives.
/// 2. Drain everything immediately available (the batch window).
/// 3. Save only the newest snapshot; it subsumes the older ones.
/// 4. Report the outcome, then answer any flush waiting on the batch.
async fn save_loop(
    store: Arc<dyn WeekStore>,
    notify: Arc<NotifyHub>,
    mut rx: mpsc::UnboundedReceiver<SaveCommand>,
) {
    while let Some(cmd) = rx.recv().await {
        let mut latest = None;
        let mut flushes = Vec::new();
        let mut queued = 0usize;

        let mut next = Some(cmd);
        while let Some(cmd) = next {
            match cmd {
                SaveCommand::Save(week) => {
                    queued += 1;
                    latest = Some(week);
                }
                SaveCommand::Flush { response } => flushes.push(response),
            }
            next = rx.try_recv().ok();
        }

        if let Some(week) = latest {
            if queued > 1 {
                metrics::counter!(crate::observability::SAVES_COALESCED_TOTAL)
                    .increment(queued as u64 - 1);
            }
            save_one(store.as_ref(), &notify, &week).await;
        }
        for tx in flushes {
            let _ = tx.send(());
        }
    }
}

async fn save_one(store: &dyn WeekStore, notify: &NotifyHub, week: &WeekTemplate) {
    let start = std::time::Instant::now();
    let result = store.save(week).await;
    metrics::histogram!(crate::observability::SAVE_DURATION_SECONDS)
        .record(start.elapsed().as_secs_f64());
    match result {
        Ok(()) => {
            debug!("saved week ({} blocks)", week.block_count());
            notify.send(Notice::Saved);
        }
        // The local commit stands; the next successful save catches up.
        Err(e) => {
            warn!("saving week failed: {e}");
            metrics::counter!(crate::observability::SAVE_FAILURES_TOTAL).increment(1);
            notify.send(Notice::SaveFailed {
                message: e.to_string(),
            });
        }
    }
}

/// Fire-and-forget handle to the save loop.
pub struct SaveHandle {
    tx: mpsc::UnboundedSender<SaveCommand>,
}

impl SaveHandle {
    /// Start the save loop. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn WeekStore>, notify: Arc<NotifyHub>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(save_loop(store, notify, rx));
        Self { tx }
    }

    /// Queue a snapshot. Never blocks and never fails the caller.
    pub fn request(&self, week: Arc<WeekTemplate>) {
        if self.tx.send(SaveCommand::Save(week)).is_err() {
            warn!("save loop is gone, snapshot not saved");
        }
    }

    /// Wait until every snapshot queued so far has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(SaveCommand::Flush { response: tx }).is_ok() {
            let _ = rx.await;
        }
    }
}
