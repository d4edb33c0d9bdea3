// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Progress channel registry.
//!
//! Maps a transfer ID to a single-reader bounded channel for the lifetime
//! of one progress-polling connection. The poll side opens the channel and
//! streams messages out as SSE events; the remote agent publishes into it.
//!
//! A publish must never block waiting for a reader, and a publish racing a
//! poll's teardown must not send on a closed channel: every registry
//! mutation and lookup happens under one exclusive lock, and a sender found
//! closed under that lock is removed on the spot.
//!
//! Opening a transfer's channel replaces any stale one, so each entry
//! carries a sequence number and connection teardown goes through
//! [`ProgressRegistry::release`], which removes the entry only while it
//! still belongs to the releasing connection. A reconnect that already
//! replaced the channel keeps its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffered messages per transfer channel. Overflow is reported to the
/// publisher rather than blocking it; the channel is a best-effort hint.
pub const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// No listener ever opened, or it already went away.
    #[error("no open progress channel for transfer {0}")]
    NotFound(String),

    /// The listener exists but is not draining; the message was dropped.
    #[error("progress channel for transfer {0} is full")]
    Lagged(String),
}

struct Entry {
    seq: u64,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
pub struct ProgressRegistry {
    channels: Mutex<HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the channel for a transfer, replacing any stale one, and hand
    /// back the receiving end plus the sequence number identifying this
    /// opening for [`release`](Self::release).
    pub fn open(&self, transfer_id: &str) -> (u64, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.channels
            .lock()
            .insert(transfer_id.to_string(), Entry { seq, tx });
        debug!(transfer = transfer_id, seq, "opened progress channel");
        (seq, rx)
    }

    /// Push one message towards the listener, never blocking.
    pub fn publish(&self, transfer_id: &str, message: String) -> Result<(), PublishError> {
        let mut channels = self.channels.lock();
        let Some(entry) = channels.get(transfer_id) else {
            return Err(PublishError::NotFound(transfer_id.to_string()));
        };

        match entry.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(PublishError::Lagged(transfer_id.to_string()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // The poll side went away between close and removal.
                channels.remove(transfer_id);
                Err(PublishError::NotFound(transfer_id.to_string()))
            }
        }
    }

    /// Connection-side teardown: removes the channel only while the entry
    /// still belongs to the releasing connection.
    pub fn release(&self, transfer_id: &str, seq: u64) {
        let mut channels = self.channels.lock();
        if channels
            .get(transfer_id)
            .is_some_and(|entry| entry.seq == seq)
        {
            channels.remove(transfer_id);
            debug!(transfer = transfer_id, seq, "closed progress channel");
        }
    }

    /// Unconditional teardown, for cancellation paths that must kill
    /// whatever listener is attached.
    pub fn close(&self, transfer_id: &str) {
        if self.channels.lock().remove(transfer_id).is_some() {
            debug!(transfer = transfer_id, "closed progress channel");
        }
    }

    pub fn open_channels(&self) -> usize {
        self.channels.lock().len()
    }
}
