//! One-shot rendezvous slots used to hand a connection from a request
//! handler into the session's background task.

use std::sync::Mutex;

use tokio::sync::oneshot;

/// The filler side. `fill` may succeed at most once.
pub struct SlotSender<T> {
    inner: Mutex<Option<oneshot::Sender<T>>>,
}

/// The awaiting side. `recv` consumes the slot.
pub struct SlotReceiver<T> {
    inner: Mutex<Option<oneshot::Receiver<T>>>,
}

/// Construct a fresh, empty rendezvous slot.
pub fn slot<T>() -> (SlotSender<T>, SlotReceiver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        SlotSender {
            inner: Mutex::new(Some(tx)),
        },
        SlotReceiver {
            inner: Mutex::new(Some(rx)),
        },
    )
}

impl<T> SlotSender<T> {
    /// Fill the slot. Returns `false` if it was already filled.
    pub fn fill(&self, value: T) -> bool {
        let sender = self.inner.lock().unwrap().take();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// True once `fill` has been called (successfully or not).
    pub fn is_filled(&self) -> bool {
        self.inner.lock().unwrap().is_none()
    }
}

impl<T> SlotReceiver<T> {
    /// Await the value, consuming the receiving half. Resolves to `None`
    /// if the sender was dropped without filling.
    pub async fn recv(&self) -> Option<T> {
        let receiver = self.inner.lock().unwrap().take();
        match receiver {
            Some(rx) => rx.await.ok(),
            None => None,
        }
    }
}
