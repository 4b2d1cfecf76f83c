//! Hardware simulator.
//!
//! Stands in for the card reader when no hardware is attached. Cards are
//! injected through the debug endpoints and handed to the runtime on its
//! next poll, the same path a real reader would take.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use lbk_core::reader::CardReader;

#[derive(Default)]
pub struct SimReader {
    queue: Mutex<VecDeque<Vec<u8>>>,
}

impl SimReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a simulated card presentation.
    pub fn inject(&self, raw_uid: Vec<u8>) {
        debug!(len = raw_uid.len(), "simulated card injected");
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).push_back(raw_uid);
    }
}

#[async_trait]
impl CardReader for SimReader {
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn poll_card(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
