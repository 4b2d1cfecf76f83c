//! Card mailbox bridging the scan task and the request layer.
//!
//! Holds at most one captured card UID together with its capture time and the
//! mode it was captured under. The scan controller writes captures; the
//! request layer reads and clears. Both sides go through one lock so a read
//! can never observe a half-written entry and a capture cannot be lost to a
//! concurrent clear mid-operation.
//!
//! Expiry is lazy: validity is a pure function of `(now, captured_at)`
//! evaluated at read time. There is no background sweeper.

use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{CardUid, ScanMode};

/// How long a captured UID stays readable after capture.
pub const CARD_VALIDITY_MS: u64 = 10_000;

/// A captured card, as handed to the request layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardCapture {
    pub uid: CardUid,
    pub captured_at_ms: u64,
    pub mode: ScanMode,
}

/// Single-entry mailbox with last-write-wins capture and lazy expiry.
#[derive(Default)]
pub struct CardMailbox {
    entry: Mutex<Option<CardCapture>>,
}

impl CardMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a capture, unconditionally replacing any existing entry.
    pub async fn capture(&self, uid: CardUid, mode: ScanMode, now_ms: u64) {
        let mut slot = self.entry.lock().await;
        debug!(uid = %uid, mode = %mode, "mailbox capture");
        *slot = Some(CardCapture {
            uid,
            captured_at_ms: now_ms,
            mode,
        });
    }

    /// Read the current entry, applying expiry and one-shot mode consumption.
    ///
    /// Returns `None` once `now - captured_at >= CARD_VALIDITY_MS`, and clears
    /// the stored entry the first time expiry is observed. A non-`Normal`
    /// stored mode is returned exactly once: the entry's mode is reset to
    /// `Normal` after that read while the UID and timestamp stay intact for
    /// further reads inside the validity window.
    pub async fn read(&self, now_ms: u64) -> Option<CardCapture> {
        let mut slot = self.entry.lock().await;
        let entry = slot.as_mut()?;

        if now_ms.saturating_sub(entry.captured_at_ms) >= CARD_VALIDITY_MS {
            debug!(uid = %entry.uid, "mailbox entry expired on read");
            *slot = None;
            return None;
        }

        let capture = entry.clone();
        if entry.mode != ScanMode::Normal {
            entry.mode = ScanMode::Normal;
        }
        Some(capture)
    }

    /// Empty the mailbox. Idempotent.
    pub async fn clear(&self) {
        let mut slot = self.entry.lock().await;
        *slot = None;
    }
}
