//! Shared "a submission is in flight" signal.
//!
//! One writer at a time, any number of readers. The signal starts idle and
//! only a [`SubmissionPipeline`](crate::SubmissionPipeline) can set it busy,
//! through a [`PendingGuard`] that resets it when dropped.

use std::sync::Arc;

use tokio::sync::watch;

/// Handle to a pending signal. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct PendingSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl PendingSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_pending(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> PendingObserver {
        PendingObserver {
            rx: self.tx.subscribe(),
        }
    }

    /// Take the writer role. `None` if another submission holds it.
    pub(crate) fn begin(&self) -> Option<PendingGuard> {
        let acquired = self.tx.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });
        acquired.then(|| PendingGuard {
            tx: Arc::clone(&self.tx),
        })
    }
}

impl Default for PendingSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Busy while alive.
#[derive(Debug)]
pub struct PendingGuard {
    tx: Arc<watch::Sender<bool>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.tx.send_replace(false);
    }
}

/// Read side of a [`PendingSignal`].
#[derive(Debug, Clone)]
pub struct PendingObserver {
    rx: watch::Receiver<bool>,
}

impl PendingObserver {
    pub fn is_pending(&self) -> bool {
        *self.rx.borrow()
    }

    /// Whether the signal changed since this observer last looked.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next change and return the new value.
    ///
    /// `None` once every [`PendingSignal`] handle is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Wait until the signal equals `pending`. Returns immediately if it
    /// already does; `false` if the signal was dropped first.
    pub async fn wait_for(&mut self, pending: bool) -> bool {
        self.rx.wait_for(|busy| *busy == pending).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let signal = PendingSignal::new();
        assert!(!signal.is_pending());
        assert!(!signal.subscribe().is_pending());
    }

    #[test]
    fn test_single_writer() {
        let signal = PendingSignal::new();
        let guard = signal.begin().unwrap();
        assert!(signal.is_pending());
        assert!(signal.clone().begin().is_none());
        drop(guard);
        assert!(!signal.is_pending());
        assert!(signal.begin().is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = PendingSignal::new();
        let other = signal.clone();
        let observer = other.subscribe();
        let _guard = signal.begin().unwrap();
        assert!(other.is_pending());
        assert!(observer.is_pending());
        assert!(observer.has_changed());
    }

    #[tokio::test]
    async fn test_observer_sees_transitions() {
        let signal = PendingSignal::new();
        let mut observer = signal.subscribe();

        let guard = signal.begin().unwrap();
        assert_eq!(observer.changed().await, Some(true));
        drop(guard);
        assert_eq!(observer.changed().await, Some(false));
        assert!(observer.wait_for(false).await);
    }

    #[tokio::test]
    async fn test_observer_outlives_signal() {
        let signal = PendingSignal::new();
        let mut observer = signal.subscribe();
        drop(signal);
        assert_eq!(observer.changed().await, None);
        assert!(!observer.wait_for(true).await);
    }
}
