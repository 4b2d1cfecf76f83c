//! Motion event source.
//!
//! Wraps an asynchronous edge-triggered proximity signal (originally a
//! hardware interrupt setting a flag) into a single pending bit the kiosk
//! runtime can poll or await. Repeated edges while a trigger is pending
//! collapse into one: this is deliberately not a counting queue.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Edge-triggered motion signal with at-most-one-pending semantics.
///
/// `trigger` is safe to call from any task or thread (the interrupt-shim
/// side); `take`/`wait` belong to the single consumer driving the scan
/// controller.
#[derive(Default)]
pub struct MotionSource {
    pending: AtomicBool,
    notify: Notify,
}

impl MotionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a motion edge. Collapses with any already-pending edge.
    pub fn trigger(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.notify.notify_one();
        }
    }

    /// Consume the pending edge, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Whether an edge is pending, without consuming it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until an edge is pending, then consume it.
    pub async fn wait(&self) {
        loop {
            if self.take() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_the_edge() {
        let motion = MotionSource::new();
        assert!(!motion.take());

        motion.trigger();
        assert!(motion.take());
        assert!(!motion.take());
    }

    #[test]
    fn repeated_triggers_collapse_to_one() {
        let motion = MotionSource::new();
        motion.trigger();
        motion.trigger();
        motion.trigger();

        assert!(motion.take());
        assert!(!motion.take());
    }

    #[tokio::test]
    async fn wait_returns_for_trigger_before_and_after() {
        let motion = std::sync::Arc::new(MotionSource::new());

        // Edge raised before the wait.
        motion.trigger();
        motion.wait().await;

        // Edge raised while waiting.
        let m = motion.clone();
        let waiter = tokio::spawn(async move { m.wait().await });
        tokio::task::yield_now().await;
        motion.trigger();
        waiter.await.unwrap();
    }
}
