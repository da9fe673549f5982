//! Typed reactive value publisher
//!
//! Wraps a `tokio::sync::watch` channel behind a small observer API: a
//! synchronous current-value read plus subscription for change notification.
//! Unsubscribing is dropping the receiver.

use tokio::sync::watch;

/// A single published value with subscribe/read access
///
/// The holder of the `Signal` is the sole writer; any number of subscribers
/// observe changes. Reads never block.
#[derive(Debug)]
pub struct Signal<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Signal<T> {
    /// Create a signal with an initial value
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Read the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Publish a new value, notifying all subscribers
    ///
    /// Publishes unconditionally, even if the value is unchanged.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe to value changes
    ///
    /// The receiver sees the current value immediately and is woken on every
    /// subsequent publish.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}
