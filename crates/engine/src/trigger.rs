//! Manual check trigger with depth-one debounce.

use tokio::sync::mpsc;

/// Sending half of the manual-check channel.
///
/// The channel holds at most one pending request. A trigger arriving while
/// one is already pending is dropped, not queued, so back-to-back requests
/// cannot pile up cycles.
#[derive(Clone)]
pub struct CheckTrigger {
    tx: mpsc::Sender<()>,
}

impl CheckTrigger {
    /// Request an immediate check. Returns false when one is already pending.
    pub fn fire(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Create the trigger and the receiving half consumed by the monitor.
pub fn check_trigger() -> (CheckTrigger, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    (CheckTrigger { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_pending_trigger_is_dropped() {
        let (trigger, mut rx) = check_trigger();

        assert!(trigger.fire());
        assert!(!trigger.fire());

        rx.recv().await.unwrap();
        assert!(trigger.fire());
    }
}
