//! Latest-pick-wins photo selection for an open form.
//!
//! # Responsibility
//! - Track the preview photo of an add/edit form.
//! - Run photo loads on tokio and order them by selection token.
//!
//! # Invariants
//! - Tokens increase monotonically; only the current token may set the preview.
//! - Starting a pick aborts the previous pending load.
//! - Failed or stale loads leave the preview unchanged.

use super::codec::{prepare_jpeg, PhotoResult};
use log::{debug, warn};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{AbortHandle, JoinHandle};

/// Identifies one photo pick. Newer picks get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

#[derive(Default)]
struct SelectionState {
    current: u64,
    preview: Option<Vec<u8>>,
    pending: Option<AbortHandle>,
}

impl SelectionState {
    fn invalidate(&mut self) -> SelectionToken {
        self.current += 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        SelectionToken(self.current)
    }
}

/// In-memory photo preview of an open add/edit form.
///
/// Each pick supersedes the previous one. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct PhotoSelection {
    state: Arc<Mutex<SelectionState>>,
}

/// Handle to a spawned photo load.
pub struct PendingSelection {
    pub token: SelectionToken,
    handle: JoinHandle<bool>,
}

impl PendingSelection {
    /// Waits for the load. Returns whether its photo became the preview;
    /// superseded and aborted loads return `false`.
    pub async fn wait(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

impl PhotoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pick, invalidating any earlier one.
    pub fn begin(&self) -> SelectionToken {
        self.lock().invalidate()
    }

    /// Drops interest in the pending pick, e.g. when the form is dismissed.
    ///
    /// The current preview is kept.
    pub fn cancel(&self) {
        let token = self.lock().invalidate();
        debug!("event=photo_select module=photo status=cancelled token={}", token.0);
    }

    pub fn is_current(&self, token: SelectionToken) -> bool {
        self.lock().current == token.0
    }

    /// Applies the raw bytes loaded for `token`.
    ///
    /// Returns `false` when `token` was superseded or the bytes do not
    /// decode; the preview is unchanged in both cases.
    pub fn complete(&self, token: SelectionToken, raw: &[u8]) -> bool {
        if !self.is_current(token) {
            debug!("event=photo_select module=photo status=stale token={}", token.0);
            return false;
        }

        let jpeg = match prepare_jpeg(raw) {
            Ok(jpeg) => jpeg,
            Err(err) => {
                warn!(
                    "event=photo_select module=photo status=error error_code=decode_failed token={} error={}",
                    token.0, err
                );
                return false;
            }
        };

        let mut state = self.lock();
        if state.current != token.0 {
            debug!("event=photo_select module=photo status=stale token={}", token.0);
            return false;
        }
        state.preview = Some(jpeg);
        state.pending = None;
        debug!("event=photo_select module=photo status=ok token={}", token.0);
        true
    }

    /// Spawns `load` on the current tokio runtime as the newest pick.
    ///
    /// Must be called from within a tokio runtime.
    pub fn select<F>(&self, load: F) -> PendingSelection
    where
        F: Future<Output = PhotoResult<Vec<u8>>> + Send + 'static,
    {
        let mut state = self.lock();
        let token = state.invalidate();

        let selection = self.clone();
        let handle = tokio::spawn(async move {
            match load.await {
                Ok(raw) => selection.complete(token, &raw),
                Err(err) => {
                    warn!(
                        "event=photo_select module=photo status=error error_code=load_failed token={} error={}",
                        token.0, err
                    );
                    false
                }
            }
        });
        state.pending = Some(handle.abort_handle());

        PendingSelection { token, handle }
    }

    /// JPEG bytes of the current preview.
    pub fn preview(&self) -> Option<Vec<u8>> {
        self.lock().preview.clone()
    }

    /// Takes the preview for form confirmation, leaving the selection empty.
    pub fn take_preview(&self) -> Option<Vec<u8>> {
        self.lock().preview.take()
    }

    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
