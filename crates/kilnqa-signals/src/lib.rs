//! # kilnqa-signals
//!
//! Event dispatch for kilnqa. A [`Signal`] carries one payload type; field
//! edits, submit attempts and accepted submissions are each a signal on the
//! owning form.
//!
//! Connecting returns a [`Subscription`], the disposer for that receiver.
//! Dropping it (or calling [`Subscription::dispose`]) disconnects the
//! receiver, so whoever registers handlers also owns their lifetime.
//!
//! ## Usage
//!
//! ```
//! use kilnqa_signals::Signal;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct FieldEdited(&'static str);
//!
//! let signal: Signal<FieldEdited> = Signal::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! let subscription = signal.connect(move |_edit: &FieldEdited| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert_eq!(signal.send(&FieldEdited("kiln_temperature")), 1);
//! subscription.dispose();
//! assert_eq!(signal.send(&FieldEdited("kiln_temperature")), 0);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// The type signature for a signal receiver callback.
///
/// Receivers must be `Send + Sync` so that signals can be dispatched from
/// timer tasks as well as from the caller's thread.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) + Send + Sync>;

type ReceiverList<T> = RwLock<Vec<(u64, SignalReceiver<T>)>>;

/// A signal that can be connected to and dispatched.
///
/// Receivers are called in the order they were connected.
pub struct Signal<T: 'static> {
    receivers: Arc<ReceiverList<T>>,
    next_id: AtomicU64,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connects a receiver and returns its disposer.
    ///
    /// The receiver stays connected for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription disconnects the receiver"]
    pub fn connect<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.receivers
            .write()
            .expect("signal lock poisoned")
            .push((id, Arc::new(callback)));

        let weak: Weak<ReceiverList<T>> = Arc::downgrade(&self.receivers);
        Subscription {
            disconnect: Some(Box::new(move || {
                if let Some(receivers) = weak.upgrade() {
                    receivers
                        .write()
                        .expect("signal lock poisoned")
                        .retain(|(rid, _)| *rid != id);
                }
            })),
        }
    }

    /// Sends the signal to all connected receivers and returns how many ran.
    ///
    /// The receiver list is snapshotted first, so a receiver may dispose
    /// subscriptions or connect new receivers while it runs; changes apply
    /// from the next send.
    pub fn send(&self, payload: &T) -> usize {
        let snapshot: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &snapshot {
            callback(payload);
        }
        snapshot.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.read().expect("signal lock poisoned").len()
    }
}

/// Disposer for one connected receiver.
///
/// Disconnects on [`dispose`](Self::dispose) or drop. Outliving the signal
/// is harmless.
#[must_use = "dropping the subscription disconnects the receiver"]
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Disconnects the receiver now.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn test_signal_connect_and_send() {
        let signal: Signal<String> = Signal::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let _sub = signal.connect(move |_: &String| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(signal.send(&"hello".to_string()), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_receivers_run_in_connection_order() {
        let signal: Signal<i32> = Signal::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = order.clone();
                signal.connect(move |_: &i32| order.lock().unwrap().push(i))
            })
            .collect();

        assert_eq!(signal.receiver_count(), 3);
        assert_eq!(signal.send(&42), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        drop(subs);
        assert_eq!(signal.receiver_count(), 0);
    }

    #[test]
    fn test_dispose_disconnects_only_that_receiver() {
        let signal: Signal<()> = Signal::new();

        let a = signal.connect(|(): &()| {});
        let _b = signal.connect(|(): &()| {});
        assert_eq!(signal.receiver_count(), 2);

        a.dispose();
        assert_eq!(signal.receiver_count(), 1);
    }

    #[test]
    fn test_drop_disconnects() {
        let signal: Signal<()> = Signal::new();
        {
            let _sub = signal.connect(|(): &()| {});
            assert_eq!(signal.receiver_count(), 1);
        }
        assert_eq!(signal.receiver_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_signal() {
        let signal: Signal<()> = Signal::new();
        let sub = signal.connect(|(): &()| {});
        drop(signal);
        sub.dispose();
    }

    #[test]
    fn test_receiver_can_dispose_itself_during_send() {
        let signal: Arc<Signal<()>> = Arc::new(Signal::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let slot_clone = slot.clone();
        let calls_clone = calls.clone();
        let sub = signal.connect(move |(): &()| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(own) = slot_clone.lock().unwrap().take() {
                own.dispose();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        assert_eq!(signal.send(&()), 1);
        assert_eq!(signal.send(&()), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_signal_send() {
        let signal: Signal<()> = Signal::default();
        assert_eq!(signal.send(&()), 0);
    }
}
