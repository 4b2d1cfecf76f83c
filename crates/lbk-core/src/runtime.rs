//! Kiosk runtime loop.
//!
//! Drives the scan session against wall-clock time: consumes motion edges,
//! brackets the card reader around open windows, and feeds reads into the
//! controller. Each pass polls the reader before ticking the state machine,
//! so a card presented in the last instant of the window is captured rather
//! than timed out.
//!
//! The loop is split into [`KioskRuntime::step`], a single deterministic pass
//! at an explicit timestamp, and [`KioskRuntime::run`], which repeats `step`
//! on an interval with the real clock. Observers get presentation callbacks
//! (countdown, capture, timeout) with per-second countdown deduplication.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::context::KioskContext;
use crate::reader::CardReader;
use crate::session::{CaptureNotice, Tick};
use crate::types::now_ms;

/// How often the runtime advances the session while active.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of one runtime pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// No session active.
    Idle,
    /// Window open with this many whole seconds left.
    Armed { remaining_secs: u64 },
    /// A card was captured this pass; the runtime honors `hold_ms` before
    /// the next pass.
    Captured(CaptureNotice),
    /// The window elapsed without a card.
    TimedOut,
}

/// Presentation callbacks from the runtime. All methods default to no-ops so
/// implementations subscribe only to what they render.
#[async_trait]
pub trait ScanObserver: Send + Sync {
    /// Countdown update; called once per remaining second, not per tick.
    async fn scan_armed(&self, _remaining_secs: u64) {}

    /// A card landed in the mailbox.
    async fn card_captured(&self, _notice: &CaptureNotice) {}

    /// The window closed without a card.
    async fn scan_timed_out(&self) {}
}

/// Observer that renders nothing.
pub struct NullObserver;

#[async_trait]
impl ScanObserver for NullObserver {}

pub struct KioskRuntime<R, O> {
    ctx: Arc<KioskContext>,
    reader: Arc<R>,
    observer: O,
    reader_active: bool,
    last_remaining: Option<u64>,
}

impl<R: CardReader, O: ScanObserver> KioskRuntime<R, O> {
    pub fn new(ctx: Arc<KioskContext>, reader: Arc<R>, observer: O) -> Self {
        Self {
            ctx,
            reader,
            observer,
            reader_active: false,
            last_remaining: None,
        }
    }

    /// One pass of the loop at an explicit timestamp.
    pub async fn step(&mut self, now_ms: u64) -> Step {
        self.ctx.pump_motion(now_ms).await;

        // The session can also be armed from the request layer (registration
        // modes), so reader bracketing follows the observed state rather than
        // the motion edge.
        if self.ctx.is_armed().await {
            self.reader_on().await;
        }

        if self.reader_active {
            match self.reader.poll_card().await {
                Ok(Some(raw)) => {
                    if let Some(notice) = self.ctx.card_read(&raw, now_ms).await {
                        self.reader_off().await;
                        self.last_remaining = None;
                        self.observer.card_captured(&notice).await;
                        return Step::Captured(notice);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "card reader poll failed"),
            }
        }

        match self.ctx.tick(now_ms).await {
            Tick::Idle => Step::Idle,
            Tick::Armed { remaining_secs } => {
                if self.last_remaining != Some(remaining_secs) {
                    self.last_remaining = Some(remaining_secs);
                    self.observer.scan_armed(remaining_secs).await;
                }
                Step::Armed { remaining_secs }
            }
            Tick::TimedOut => {
                self.reader_off().await;
                self.last_remaining = None;
                self.observer.scan_timed_out().await;
                Step::TimedOut
            }
        }
    }

    /// Drive the loop against the real clock. Runs until the owning task is
    /// dropped or aborted.
    pub async fn run(mut self) {
        loop {
            match self.step(now_ms()).await {
                Step::Captured(notice) => {
                    tokio::time::sleep(Duration::from_millis(notice.hold_ms)).await;
                }
                _ => tokio::time::sleep(TICK_INTERVAL).await,
            }
        }
    }

    async fn reader_on(&mut self) {
        if self.reader_active {
            return;
        }
        if let Err(err) = self.reader.start().await {
            warn!(error = %err, "card reader start failed");
            return;
        }
        self.reader_active = true;
    }

    async fn reader_off(&mut self) {
        if !self.reader_active {
            return;
        }
        if let Err(err) = self.reader.stop().await {
            warn!(error = %err, "card reader stop failed");
        }
        self.reader_active = false;
    }
}
