//! Wall-clock bound on price fetches.
//!
//! The inner fetch runs on its own thread; the caller waits at most `timeout`
//! for the result. A fetch that overruns is abandoned (its thread finishes in
//! the background and its result is dropped) and the caller gets
//! `DataError::Timeout`.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::provider::{DataError, FetchRequest, PriceTableProvider};
use crate::domain::PriceTable;

pub struct TimeoutProvider {
    inner: Arc<dyn PriceTableProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn PriceTableProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PriceTableProvider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceTable, DataError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let request = request.clone();

        thread::Builder::new()
            .name("pledgeboard-fetch".into())
            .spawn(move || {
                // Receiver is gone if the caller already timed out
                let _ = tx.send(inner.fetch(&request));
            })
            .map_err(|e| DataError::Other(format!("failed to spawn fetch thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(timeout = ?self.timeout, "price fetch abandoned");
                Err(DataError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(DataError::Other("fetch thread ended without a result".into()))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
