//! Multi-subscriber `EventBus` for depsync events.
//!
//! The tracing layer pushes into an unbounded mpsc channel; a forwarding task
//! fans every event out to all broadcast subscribers in arrival order.

use crate::event::SyncEvent;
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc};

/// Events a slow subscriber may fall behind by before it starts skipping.
const BROADCAST_CAPACITY: usize = 1000;

/// Multi-subscriber event bus.
///
/// Must be created inside a tokio runtime: construction spawns the forwarding
/// task.
#[derive(Debug)]
pub struct EventBus {
    /// `None` after `shutdown()`.
    sender: Mutex<Option<mpsc::UnboundedSender<SyncEvent>>>,
    broadcast_tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Create a bus and start its forwarding task.
    #[must_use]
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SyncEvent>();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        let forward_tx = broadcast_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                // No subscribers is not an error.
                let _ = forward_tx.send(event);
            }
        });

        Self {
            sender: Mutex::new(Some(sender)),
            broadcast_tx,
        }
    }

    /// Channel the [`crate::SyncEventLayer`] writes into.
    ///
    /// Returns `None` if the bus has been shut down.
    #[must_use]
    pub fn sender(&self) -> Option<mpsc::UnboundedSender<SyncEvent>> {
        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    /// Drop the bus's own sender. Safe to call more than once.
    ///
    /// Senders handed out earlier stay usable until they are dropped.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            let _ = guard.take();
        }
    }

    /// Subscribe to events sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            inner: self.broadcast_tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end handed to a renderer.
#[derive(Debug)]
pub struct EventReceiver {
    inner: broadcast::Receiver<SyncEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` once every sender is gone. Lagging receivers skip the
    /// events they missed.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event receiver lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
