//! One-shot startup gate.
//!
//! Fires exactly once when the initial bootstrap completes. Any number of
//! tasks may wait on it before, during or after the fire.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

pub struct StartupGate {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl StartupGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            fired: AtomicBool::new(false),
            tx,
        }
    }

    /// Release every current and future waiter.
    ///
    /// # Panics
    ///
    /// Panics if the gate has already fired; that is a sequencing bug in the caller.
    pub fn fire(&self) {
        let already = self.fired.swap(true, Ordering::AcqRel);
        assert!(!already, "startup gate fired twice");
        self.tx.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Wait until the gate fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only ends on fire.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for StartupGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_after_fire_returns_immediately() {
        let gate = StartupGate::new();
        gate.fire();
        assert!(gate.is_fired());
        tokio::time::timeout(Duration::from_millis(50), gate.wait())
            .await
            .expect("wait should not block after fire");
    }

    #[tokio::test]
    async fn waiters_released_by_single_fire() {
        let gate = Arc::new(StartupGate::new());
        let mut waiters = Vec::new();
        for _ in 0..8 {
            let g = gate.clone();
            waiters.push(tokio::spawn(async move { g.wait().await }));
        }
        tokio::task::yield_now().await;
        gate.fire();
        for w in waiters {
            tokio::time::timeout(Duration::from_secs(1), w)
                .await
                .expect("waiter released")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn unfired_gate_blocks() {
        let gate = StartupGate::new();
        let res = tokio::time::timeout(Duration::from_millis(30), gate.wait()).await;
        assert!(res.is_err());
        assert!(!gate.is_fired());
    }

    #[test]
    #[should_panic(expected = "fired twice")]
    fn double_fire_panics() {
        let gate = StartupGate::new();
        gate.fire();
        gate.fire();
    }
}
