use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::backend::PathPair;
use crate::services::backend_client::Backend;

pub const OVERRIDE_DEBOUNCE: Duration = Duration::from_millis(500);

struct Pending {
    seq: u64,
    key: String,
    pair: PathPair,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    next_seq: u64,
    pending: Option<Pending>,
}

impl Slot {
    /// Takes the pending write only if it is still the one scheduled as `seq`.
    fn take_if(&mut self, seq: u64) -> Option<(String, PathPair)> {
        match &self.pending {
            Some(pending) if pending.seq == seq => self
                .pending
                .take()
                .map(|pending| (pending.key, pending.pair)),
            _ => None,
        }
    }
}

/// Debounced writer for per-preset directory overrides.
#[derive(Clone)]
pub struct OverrideWriter {
    backend: Arc<dyn Backend>,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl OverrideWriter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_delay(backend, OVERRIDE_DEBOUNCE)
    }

    pub fn with_delay(backend: Arc<dyn Backend>, delay: Duration) -> Self {
        Self {
            backend,
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Schedules a write, replacing any write still waiting out its delay.
    pub fn schedule(&self, preset_key: &str, pair: PathPair) {
        let mut slot = self.lock();
        if let Some(previous) = slot.pending.take() {
            previous.task.abort();
        }
        slot.next_seq += 1;
        let seq = slot.next_seq;

        let backend = self.backend.clone();
        let shared = self.slot.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let taken = shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take_if(seq);
            if let Some((key, pair)) = taken {
                if let Err(err) = backend.set_preset_override(&key, &pair).await {
                    warn!(preset = %key, error = %err, "failed to persist preset override");
                }
            }
        });

        debug!(preset = preset_key, seq, "override write scheduled");
        slot.pending = Some(Pending {
            seq,
            key: preset_key.to_string(),
            pair,
            task,
        });
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Writes the pending pair now. Returns whether anything was written.
    pub async fn flush(&self) -> Result<bool, AppError> {
        let pending = self.lock().pending.take();
        let Some(pending) = pending else {
            return Ok(false);
        };
        pending.task.abort();
        self.backend
            .set_preset_override(&pending.key, &pending.pair)
            .await?;
        Ok(true)
    }

    pub fn cancel(&self) {
        if let Some(pending) = self.lock().pending.take() {
            pending.task.abort();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
