//! Shared kiosk context.
//!
//! Bundles the card mailbox, the scan controller, and the motion source into
//! one owned object shared (behind synchronization) by the runtime task and
//! the request layer, instead of free-standing process-wide state. The
//! controller lock is the point that makes the one-active-session invariant
//! atomic against concurrent motion and explicit re-arm triggers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::mailbox::{CardCapture, CardMailbox};
use crate::motion::MotionSource;
use crate::session::{CaptureNotice, ScanController, ScanState, Tick};
use crate::types::ScanMode;

pub struct KioskContext {
    mailbox: Arc<CardMailbox>,
    controller: Mutex<ScanController>,
    motion: MotionSource,
}

impl KioskContext {
    pub fn new() -> Arc<Self> {
        let mailbox = Arc::new(CardMailbox::new());
        let controller = Mutex::new(ScanController::new(mailbox.clone()));
        Arc::new(Self {
            mailbox,
            controller,
            motion: MotionSource::new(),
        })
    }

    /// The motion source; its `trigger` side is handed to the sensor shim.
    pub fn motion(&self) -> &MotionSource {
        &self.motion
    }

    /// Consume a pending motion edge and arm the session if idle.
    /// Returns whether a window was opened.
    pub async fn pump_motion(&self, now_ms: u64) -> bool {
        if !self.motion.take() {
            return false;
        }
        self.controller.lock().await.handle_motion(now_ms).await
    }

    /// Advance the session state machine by one tick.
    pub async fn tick(&self, now_ms: u64) -> Tick {
        self.controller.lock().await.tick(now_ms)
    }

    /// Feed a raw card read from the hardware collaborator.
    pub async fn card_read(&self, raw_uid: &[u8], now_ms: u64) -> Option<CaptureNotice> {
        self.controller.lock().await.card_read(raw_uid, now_ms).await
    }

    pub async fn session_state(&self) -> ScanState {
        self.controller.lock().await.state()
    }

    pub async fn is_armed(&self) -> bool {
        self.controller.lock().await.is_armed()
    }

    /// Request-layer mode selection; registration modes re-arm immediately.
    pub async fn set_mode(&self, mode: ScanMode, now_ms: u64) -> bool {
        self.controller.lock().await.set_mode(mode, now_ms).await
    }

    pub async fn mode(&self) -> ScanMode {
        self.controller.lock().await.mode()
    }

    /// Request-layer read of the last capture.
    ///
    /// Applies the mailbox's expiry and one-shot mode reset; when a
    /// non-normal capture mode is observed, the controller's pending mode is
    /// consumed as well so the registration mode affects exactly one capture.
    pub async fn read_capture(&self, now_ms: u64) -> Option<CardCapture> {
        let capture = self.mailbox.read(now_ms).await?;
        if capture.mode != ScanMode::Normal {
            self.controller.lock().await.reset_mode();
        }
        Some(capture)
    }

    /// Request-layer clear of the last capture. Idempotent.
    pub async fn clear_capture(&self) {
        self.mailbox.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &[u8] = &[0x04, 0xA3, 0xFF, 0x12];

    #[tokio::test]
    async fn pump_motion_requires_a_pending_edge() {
        let ctx = KioskContext::new();
        assert!(!ctx.pump_motion(0).await);

        ctx.motion().trigger();
        assert!(ctx.pump_motion(0).await);
        assert!(ctx.is_armed().await);
    }

    #[tokio::test]
    async fn registration_mode_is_one_shot_through_read() {
        let ctx = KioskContext::new();

        ctx.set_mode(ScanMode::RegisterBook, 0).await;
        ctx.card_read(RAW, 1_200).await.unwrap();

        let first = ctx.read_capture(1_300).await.unwrap();
        assert_eq!(first.mode, ScanMode::RegisterBook);
        // Both the stored mode and the controller's pending mode reset.
        let second = ctx.read_capture(1_400).await.unwrap();
        assert_eq!(second.mode, ScanMode::Normal);
        assert_eq!(ctx.mode().await, ScanMode::Normal);
    }

    #[tokio::test]
    async fn clear_capture_empties_the_mailbox() {
        let ctx = KioskContext::new();
        ctx.motion().trigger();
        ctx.pump_motion(0).await;
        ctx.card_read(RAW, 1_000).await.unwrap();

        ctx.clear_capture().await;
        assert!(ctx.read_capture(1_100).await.is_none());
    }
}
