use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::modules::relationship::model::DerivedStatus;

/// Signal emitted after a locally confirmed transition so sibling sessions of
/// the same account converge without polling the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSignal {
    pub status: DerivedStatus,
    pub target_id: Uuid,
}

/// Same-origin signal path between open sessions of one account. Two
/// interchangeable backends exist; callers depend only on this trait.
/// Delivery is best-effort and may duplicate; consumers reconcile by rank.
pub trait SignalBus: Send + Sync {
    fn publish(&self, signal: SessionSignal);
    fn subscribe(&self) -> broadcast::Receiver<SessionSignal>;
}

/// Native channel backend.
pub struct ChannelSignalBus {
    tx: broadcast::Sender<SessionSignal>,
}

impl ChannelSignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }
}

impl Default for ChannelSignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus for ChannelSignalBus {
    fn publish(&self, signal: SessionSignal) {
        // No subscribers is fine; the signal is an optimization.
        let _ = self.tx.send(signal);
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }
}

/// Append-only journal shared by sessions on hosts without a native channel.
#[derive(Default)]
pub struct SignalJournal {
    entries: Mutex<Vec<SessionSignal>>,
}

impl SignalJournal {
    pub fn append(&self, signal: SessionSignal) {
        self.entries.lock().unwrap().push(signal);
    }

    pub fn read_from(&self, cursor: usize) -> Vec<SessionSignal> {
        let entries = self.entries.lock().unwrap();
        entries[cursor.min(entries.len())..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage-polling fallback backend: publishes by appending to the shared
/// journal and forwards newly observed entries to subscribers on an interval.
/// The poller also sees this session's own appends; consumers are idempotent,
/// so the echo is harmless.
pub struct StorageSignalBus {
    journal: Arc<SignalJournal>,
    tx: broadcast::Sender<SessionSignal>,
}

impl StorageSignalBus {
    pub fn new(journal: Arc<SignalJournal>, poll_interval: Duration) -> Self {
        let (tx, _) = broadcast::channel(32);

        // Snapshot the cursor now: entries appended after construction are
        // forwarded, older ones are not replayed.
        let mut cursor = journal.len();
        let poll_journal = journal.clone();
        let poll_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                for signal in poll_journal.read_from(cursor) {
                    let _ = poll_tx.send(signal);
                }
                cursor = poll_journal.len();
            }
        });

        Self { journal, tx }
    }
}

impl SignalBus for StorageSignalBus {
    fn publish(&self, signal: SessionSignal) {
        self.journal.append(signal);
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }
}
