//! Process-wide logout broadcast.
//!
//! Every controller sharing a signal observes a logout raised by any of them
//! or by the API client, the way every open tab of the dashboard does.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Default number of undelivered events kept per subscriber
pub const DEFAULT_CAPACITY: usize = 16;

/// Why a logout was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out
    UserRequested,
    /// An API call was rejected with 401
    Unauthorized,
}

/// Logout event delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutEvent {
    /// Position of this event in publish order, starting at 1
    pub seq: u64,
    pub reason: LogoutReason,
}

/// Publish/subscribe channel for logout events
pub trait LogoutSignal: Send + Sync {
    /// Deliver a logout to every current subscriber, returning its sequence number
    fn publish(&self, reason: LogoutReason) -> u64;

    /// Receive every event published from now on
    fn subscribe(&self) -> broadcast::Receiver<LogoutEvent>;

    /// Sequence number of the most recent publish, 0 if none
    fn last_seq(&self) -> u64;
}

/// [`LogoutSignal`] over a tokio broadcast channel
#[derive(Debug)]
pub struct BroadcastLogoutSignal {
    tx: broadcast::Sender<LogoutEvent>,
    seq: AtomicU64,
}

impl BroadcastLogoutSignal {
    /// Create a signal buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastLogoutSignal {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogoutSignal for BroadcastLogoutSignal {
    fn publish(&self, reason: LogoutReason) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.tx.send(LogoutEvent { seq, reason }) {
            Ok(receivers) => log::debug!("Logout #{seq} ({reason:?}) sent to {receivers} listeners"),
            Err(_) => log::debug!("Logout #{seq} ({reason:?}) raised with no listeners"),
        }
        seq
    }

    fn subscribe(&self) -> broadcast::Receiver<LogoutEvent> {
        self.tx.subscribe()
    }

    fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }
}
