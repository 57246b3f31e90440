//! Shutdown — the Running → Stopped state machine and the broadcast signal.

use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::watch;

const RUNNING: u8 = 0;
const STOPPED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Stopped,
}

/// Shared shutdown state observed by the accept loop and every reader.
///
/// The transition to `Stopped` happens at most once; whichever caller wins
/// the compare-and-set is the only one that releases resources.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: AtomicU8,
    /// Watch never loses the value: receivers created after the send still
    /// observe `true`.
    signal: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(RUNNING),
            signal,
        }
    }

    pub fn state(&self) -> ServerState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ServerState::Running,
            _ => ServerState::Stopped,
        }
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state() == ServerState::Stopped
    }

    /// Move to `Stopped` and broadcast the signal.
    ///
    /// Returns `true` only for the caller that performed the transition.
    pub fn stop(&self) -> bool {
        let won = self
            .state
            .compare_exchange(RUNNING, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.signal.send_replace(true);
        }
        won
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.signal.subscribe(),
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// One task's view of the shutdown broadcast.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been triggered (immediately if it already was).
    ///
    /// Cancel safe, so it can sit in a `select!` loop.
    pub async fn recv(&mut self) {
        // An error means the coordinator is gone, which is as final as a stop.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_starts_running() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.state(), ServerState::Running);
        assert!(!coordinator.subscribe().is_triggered());
    }

    #[test]
    fn test_stop_is_one_shot() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.stop());
        assert!(!coordinator.stop());
        assert!(!coordinator.stop());
        assert_eq!(coordinator.state(), ServerState::Stopped);
    }

    #[test]
    fn test_concurrent_stop_has_single_winner() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                std::thread::spawn(move || coordinator.stop())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_signal_wakes_waiting_task() {
        let coordinator = ShutdownCoordinator::new();
        let mut signal = coordinator.subscribe();

        let waiter = tokio::spawn(async move {
            signal.recv().await;
            42
        });

        coordinator.stop();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake up")
            .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_stop() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.stop();

        let mut signal = coordinator.subscribe();
        assert!(signal.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), signal.recv())
            .await
            .expect("recv should resolve immediately after stop");
    }
}
