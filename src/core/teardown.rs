//! Teardown signalling.
//!
//! A [`Teardown`] is owned by whoever mounts the display. Every suspended
//! step holds a [`CancelSignal`] and races it against its own work.

use tokio::sync::watch;

/// Owner side of the teardown signal
#[derive(Debug)]
pub struct Teardown {
    tx: watch::Sender<bool>,
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a signal observers can await
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Idempotent.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observer side of the teardown signal
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once teardown has fired
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Owner dropped without firing: never resolves
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_fires() {
        let teardown = Teardown::new();
        let mut signal = teardown.signal();
        assert!(!signal.is_cancelled());

        teardown.fire();
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .unwrap();
        assert!(signal.is_cancelled());
        assert!(teardown.is_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_owner_never_fires() {
        let teardown = Teardown::new();
        let mut signal = teardown.signal();
        drop(teardown);

        let waited = tokio::time::timeout(Duration::from_secs(5), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
