//! Card reader seam.
//!
//! The runtime drives a reader only while a scan window is open; `start` and
//! `stop` bracket the window so an implementation can power the field down
//! between sessions.

use async_trait::async_trait;

/// Hardware seam for the card reader.
///
/// `poll_card` is non-blocking from the runtime's perspective: it returns
/// `Ok(None)` when no card is in the field right now. Errors are transport
/// faults (bus, driver), not "no card".
#[async_trait]
pub trait CardReader: Send + Sync {
    /// Energize the reader for an open scan window.
    async fn start(&self) -> anyhow::Result<()>;

    /// One read attempt. `Some(bytes)` is the raw UID of a present card.
    async fn poll_card(&self) -> anyhow::Result<Option<Vec<u8>>>;

    /// Power the reader back down after the window closes.
    async fn stop(&self) -> anyhow::Result<()>;
}

/// Reader that never sees a card. Useful when running the request layer
/// without hardware attached.
pub struct IdleReader;

#[async_trait]
impl CardReader for IdleReader {
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn poll_card(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
