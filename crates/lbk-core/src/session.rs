//! Scan-session state machine.
//!
//! Converts a motion event (or an explicit re-arm from the request layer)
//! into a bounded opportunity to read one card, writing the result into the
//! [`CardMailbox`].
//!
//! Transitions:
//! - `Idle --motion--> Armed` (ignored unless `Idle`)
//! - `Idle --rearm(mode)--> Armed` (registration modes; same one-active rule)
//! - `Armed --tick--> Armed` while `elapsed < SCAN_WINDOW_MS`
//! - `Armed --card_read--> Idle`, emitting a capture with a display-hold hint
//! - `Armed --tick, elapsed >= SCAN_WINDOW_MS--> Idle`, emitting a timeout
//!
//! Timeouts are recomputed from the stored arm time on every tick, never from
//! a countdown that can drift under scheduling delay. The exact boundary
//! `elapsed == SCAN_WINDOW_MS` is a timeout, not a capture, so `card_read`
//! rejects reads at or past the boundary and callers must attempt the read
//! before ticking.

use std::sync::Arc;

use tracing::{debug, info};

use crate::mailbox::CardMailbox;
use crate::types::{CardUid, ScanMode};

/// Length of the scan window opened by a motion event.
pub const SCAN_WINDOW_MS: u64 = 5_000;

/// How long presentation collaborators should hold the capture notice before
/// resuming their idle display. The session itself returns to `Idle`
/// immediately; honoring the hold is the runtime's concern.
pub const CAPTURE_HOLD_MS: u64 = 2_000;

/// State of the scan session. At most one session is non-idle system-wide;
/// the controller is driven behind a single lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// No window open.
    Idle,
    /// Window open since `armed_at_ms`, waiting for a card.
    Armed { armed_at_ms: u64 },
}

/// Outcome of advancing the state machine by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do.
    Idle,
    /// Window still open; countdown for presentation (rounds down).
    Armed { remaining_secs: u64 },
    /// Window elapsed without a read; session returned to idle. Absence of a
    /// capture is a normal outcome, not an error.
    TimedOut,
}

/// Notice emitted on a successful capture, for presentation collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureNotice {
    pub uid: CardUid,
    pub mode: ScanMode,
    /// Suggested display-hold duration before the kiosk resumes idling.
    pub hold_ms: u64,
}

/// The scan-session controller.
///
/// Owns the current state and the mode the next capture will be interpreted
/// under, and writes captures into the shared mailbox.
pub struct ScanController {
    state: ScanState,
    mode: ScanMode,
    mailbox: Arc<CardMailbox>,
}

impl ScanController {
    pub fn new(mailbox: Arc<CardMailbox>) -> Self {
        Self {
            state: ScanState::Idle,
            mode: ScanMode::Normal,
            mailbox,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, ScanState::Armed { .. })
    }

    /// Mode the next capture will be stored under.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Reset the pending mode to `Normal` (one-shot consumption, driven by
    /// the context after a mailbox read observes a non-normal capture).
    pub fn reset_mode(&mut self) {
        self.mode = ScanMode::Normal;
    }

    /// Open a scan window for a motion event. Ignored (returns `false`)
    /// while a session is already active.
    ///
    /// Arming discards any stale mailbox entry so the window can only ever
    /// surface a card presented during it.
    pub async fn handle_motion(&mut self, now_ms: u64) -> bool {
        if self.state != ScanState::Idle {
            debug!("motion ignored: session already active");
            return false;
        }
        self.mailbox.clear().await;
        self.state = ScanState::Armed { armed_at_ms: now_ms };
        info!(mode = %self.mode, "scan window armed");
        true
    }

    /// Select the interpretation of the next capture and, for registration
    /// modes, open a window without waiting for motion.
    ///
    /// The mode change always takes effect; the arm itself obeys the
    /// one-active-session rule. Returns whether a window was opened.
    pub async fn set_mode(&mut self, mode: ScanMode, now_ms: u64) -> bool {
        self.mode = mode;
        if mode == ScanMode::Normal {
            return false;
        }
        self.handle_motion(now_ms).await
    }

    /// Advance the state machine. Timeout is evaluated from the stored arm
    /// time; callers attempt `card_read` first on every tick so a capture
    /// racing the boundary is checked before the timeout.
    pub fn tick(&mut self, now_ms: u64) -> Tick {
        match self.state {
            ScanState::Idle => Tick::Idle,
            ScanState::Armed { armed_at_ms } => {
                let elapsed = now_ms.saturating_sub(armed_at_ms);
                if elapsed >= SCAN_WINDOW_MS {
                    self.state = ScanState::Idle;
                    info!("scan window timed out");
                    Tick::TimedOut
                } else {
                    Tick::Armed {
                        remaining_secs: SCAN_WINDOW_MS / 1_000 - elapsed / 1_000,
                    }
                }
            }
        }
    }

    /// Accept a card read from the hardware collaborator.
    ///
    /// Only accepted while armed and strictly inside the window; a read at or
    /// past the boundary is dropped and the next tick times the session out.
    /// On success the capture lands in the mailbox and the session returns to
    /// `Idle` immediately; the returned notice carries the display-hold hint.
    pub async fn card_read(&mut self, raw_uid: &[u8], now_ms: u64) -> Option<CaptureNotice> {
        let ScanState::Armed { armed_at_ms } = self.state else {
            debug!("card read ignored: no window open");
            return None;
        };
        if now_ms.saturating_sub(armed_at_ms) >= SCAN_WINDOW_MS {
            return None;
        }

        let uid = CardUid::from_raw(raw_uid);
        let mode = self.mode;
        self.mailbox.capture(uid.clone(), mode, now_ms).await;
        self.state = ScanState::Idle;
        info!(uid = %uid, mode = %mode, "card captured");

        Some(CaptureNotice {
            uid,
            mode,
            hold_ms: CAPTURE_HOLD_MS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (ScanController, Arc<CardMailbox>) {
        let mailbox = Arc::new(CardMailbox::new());
        (ScanController::new(mailbox.clone()), mailbox)
    }

    const RAW: &[u8] = &[0x04, 0xA3, 0xFF, 0x12];

    #[tokio::test]
    async fn motion_arms_only_from_idle() {
        let (mut ctrl, _mailbox) = controller();

        assert!(ctrl.handle_motion(0).await);
        assert_eq!(ctrl.state(), ScanState::Armed { armed_at_ms: 0 });

        // Second motion while armed is ignored and keeps the original window.
        assert!(!ctrl.handle_motion(100).await);
        assert_eq!(ctrl.state(), ScanState::Armed { armed_at_ms: 0 });
    }

    #[tokio::test]
    async fn arming_clears_stale_mailbox_entry() {
        let (mut ctrl, mailbox) = controller();
        mailbox.capture(CardUid::from_raw(&[0x01]), ScanMode::Normal, 0).await;

        ctrl.handle_motion(1_000).await;
        assert!(mailbox.read(1_001).await.is_none());
    }

    #[tokio::test]
    async fn countdown_rounds_down() {
        let (mut ctrl, _mailbox) = controller();
        ctrl.handle_motion(0).await;

        assert_eq!(ctrl.tick(0), Tick::Armed { remaining_secs: 5 });
        assert_eq!(ctrl.tick(999), Tick::Armed { remaining_secs: 5 });
        assert_eq!(ctrl.tick(1_000), Tick::Armed { remaining_secs: 4 });
        assert_eq!(ctrl.tick(4_999), Tick::Armed { remaining_secs: 1 });
    }

    #[tokio::test]
    async fn window_boundary_is_a_timeout() {
        let (mut ctrl, mailbox) = controller();
        ctrl.handle_motion(0).await;

        // A read exactly at the boundary loses to the timeout.
        assert!(ctrl.card_read(RAW, SCAN_WINDOW_MS).await.is_none());
        assert_eq!(ctrl.tick(SCAN_WINDOW_MS), Tick::TimedOut);
        assert_eq!(ctrl.state(), ScanState::Idle);
        assert!(mailbox.read(SCAN_WINDOW_MS).await.is_none());
    }

    #[tokio::test]
    async fn capture_writes_mailbox_and_returns_to_idle() {
        let (mut ctrl, mailbox) = controller();
        ctrl.handle_motion(0).await;

        let notice = ctrl.card_read(RAW, 1_200).await.unwrap();
        assert_eq!(notice.uid.as_str(), "04A3FF12");
        assert_eq!(notice.hold_ms, CAPTURE_HOLD_MS);
        assert_eq!(ctrl.state(), ScanState::Idle);

        let capture = mailbox.read(1_300).await.unwrap();
        assert_eq!(capture.uid.as_str(), "04A3FF12");
        assert_eq!(capture.captured_at_ms, 1_200);
    }

    #[tokio::test]
    async fn card_read_is_ignored_while_idle() {
        let (mut ctrl, mailbox) = controller();
        assert!(ctrl.card_read(RAW, 100).await.is_none());
        assert!(mailbox.read(200).await.is_none());
    }

    #[tokio::test]
    async fn set_mode_registration_arms_without_motion() {
        let (mut ctrl, _mailbox) = controller();

        assert!(ctrl.set_mode(ScanMode::RegisterUser, 50).await);
        assert_eq!(ctrl.mode(), ScanMode::RegisterUser);
        assert_eq!(ctrl.state(), ScanState::Armed { armed_at_ms: 50 });
    }

    #[tokio::test]
    async fn set_mode_normal_does_not_arm() {
        let (mut ctrl, _mailbox) = controller();

        assert!(!ctrl.set_mode(ScanMode::Normal, 50).await);
        assert_eq!(ctrl.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn set_mode_while_armed_changes_mode_but_keeps_window() {
        let (mut ctrl, _mailbox) = controller();
        ctrl.handle_motion(0).await;

        assert!(!ctrl.set_mode(ScanMode::RegisterBook, 100).await);
        assert_eq!(ctrl.state(), ScanState::Armed { armed_at_ms: 0 });
        assert_eq!(ctrl.mode(), ScanMode::RegisterBook);
    }

    #[tokio::test]
    async fn mode_persists_across_a_timed_out_window() {
        let (mut ctrl, mailbox) = controller();
        ctrl.set_mode(ScanMode::RegisterBook, 0).await;
        assert_eq!(ctrl.tick(SCAN_WINDOW_MS), Tick::TimedOut);

        // Next motion still scans under the registration mode; consumption
        // happens only via the mailbox read.
        ctrl.handle_motion(6_000).await;
        ctrl.card_read(RAW, 6_500).await.unwrap();
        let capture = mailbox.read(6_600).await.unwrap();
        assert_eq!(capture.mode, ScanMode::RegisterBook);
    }
}
