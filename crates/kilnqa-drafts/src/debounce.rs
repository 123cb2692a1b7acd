//! Cancel-and-reschedule timers.
//!
//! [`debounce`] wraps an action so that bursts of calls collapse into one:
//! every call cancels the schedule armed by the previous call and arms a new
//! one with its own arguments. The action runs once `delay` has passed
//! without another call. Nothing is queued and nothing is awaited.
//!
//! Actions are synchronous and may block (a file write, say), so they run on
//! the runtime's blocking pool rather than on a worker thread. Once an action
//! has started, canceling the schedule no longer stops it.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use kilnqa_core::{QaError, QaResult};

/// A debounced action. See [`debounce`].
pub struct Debounced<A> {
    action: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Wraps `action` so it runs `delay` after the most recent call.
///
/// Timers run on the current tokio runtime, which must exist when this is
/// called.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kilnqa_drafts::debounce::debounce;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let save = debounce(|text: String| println!("saving {text}"), Duration::from_millis(250))
///     .unwrap();
/// save.call("draft 1".to_string());
/// save.call("draft 2".to_string()); // replaces the first schedule
/// # }
/// ```
pub fn debounce<A, F>(action: F, delay: Duration) -> QaResult<Debounced<A>>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    let runtime = Handle::try_current().map_err(|e| {
        QaError::ConfigurationError(format!("debounce needs a tokio runtime: {e}"))
    })?;
    Ok(Debounced {
        action: Arc::new(action),
        delay,
        runtime,
        pending: Mutex::new(None),
    })
}

impl<A: Send + 'static> Debounced<A> {
    /// Cancels any pending schedule and arms a new one with `args`.
    pub fn call(&self, args: A) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let mut pending = self.pending.lock().expect("debounce lock poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let runtime = self.runtime.clone();
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = runtime.spawn_blocking(move || action(args)).await {
                tracing::warn!(error = %err, "debounced action failed");
            }
        }));
    }

    /// Cancels the pending schedule. Returns `true` if one was armed.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().expect("debounce lock poisoned");
        pending.take().is_some_and(|handle| {
            let armed = !handle.is_finished();
            handle.abort();
            armed
        })
    }

    /// Returns `true` while a schedule is armed and has not fired.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("debounce lock poisoned")
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The quiescence delay.
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl<A> Drop for Debounced<A> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

impl<A> fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
