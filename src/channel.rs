//! Closable, single-consumer async queue used as the status-event pipe
//! between a session's copy loop and its WebSocket writer task.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::utils::error::{RelayError, Result};

struct Inner<T> {
    buffer: VecDeque<T>,
    closed: bool,
    waiter: Option<oneshot::Sender<Option<T>>>,
}

/// A closable SPSC queue. `put` never blocks; `get` suspends until an item
/// is available or the channel closes.
pub struct Channel<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                buffer: VecDeque::new(),
                closed: false,
                waiter: None,
            }),
        }
    }

    /// Enqueue an item. Fails if the channel is closed.
    pub fn put(&self, item: T) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(RelayError::ChannelClosed);
        }
        if let Some(waiter) = inner.waiter.take() {
            // A consumer is already suspended; hand the item directly to it.
            let _ = waiter.send(Some(item));
        } else {
            inner.buffer.push_back(item);
        }
        Ok(())
    }

    /// Best-effort enqueue; returns `false` instead of failing when closed.
    pub fn try_put(&self, item: T) -> bool {
        self.put(item).is_ok()
    }

    /// Await the next item, or fail with `ChannelClosed` once drained and closed.
    pub async fn get(&self) -> Result<T> {
        let rx = {
            let mut inner = self.inner.lock().unwrap();
            if let Some(item) = inner.buffer.pop_front() {
                return Ok(item);
            }
            if inner.closed {
                return Err(RelayError::ChannelClosed);
            }
            let (tx, rx) = oneshot::channel();
            inner.waiter = Some(tx);
            rx
        };
        match rx.await {
            Ok(Some(item)) => Ok(item),
            // Sender side dropped without delivering, or delivered `None` on close.
            _ => Err(RelayError::ChannelClosed),
        }
    }

    /// Non-suspending variant of `get`.
    pub fn get_nowait(&self) -> Result<T> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(item) = inner.buffer.pop_front() {
            return Ok(item);
        }
        if inner.closed {
            Err(RelayError::ChannelClosed)
        } else {
            Err(RelayError::ChannelEmpty)
        }
    }

    /// Idempotent close. Wakes any suspended consumer once the buffer is drained.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        inner.closed = true;
        if inner.buffer.is_empty() {
            if let Some(waiter) = inner.waiter.take() {
                let _ = waiter.send(None);
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().buffer.len()
    }

    pub fn empty(&self) -> bool {
        self.pending() == 0
    }

    pub fn closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    pub fn done(&self) -> bool {
        self.closed() && self.empty()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
