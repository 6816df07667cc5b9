//! Process-wide single-flight cooldown guard
//!
//! After an admission the guard stays busy for the whole window. The reset
//! task is spawned at admission and runs regardless of what happens to the
//! admitted request.

use crate::error::GatewayError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

/// Default cooldown window in milliseconds
pub const DEFAULT_WINDOW_MS: u64 = 5000;

#[derive(Debug, Default)]
struct DispatchLock {
    busy: bool,
    last_admission: Option<Instant>,
    reset_task: Option<AbortHandle>,
}

/// Admits at most one request per window, process-wide
#[derive(Debug, Clone)]
pub struct CooldownGuard {
    window: Duration,
    state: Arc<Mutex<DispatchLock>>,
}

impl CooldownGuard {
    /// Create a guard with the given window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(DispatchLock::default())),
        }
    }

    /// Cooldown window
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, DispatchLock> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admit the caller or reject with `CooldownActive`. Rejections are not queued.
    pub fn try_admit(&self) -> Result<(), GatewayError> {
        let mut state = self.lock();
        let now = Instant::now();

        let within_window = state
            .last_admission
            .is_some_and(|last| now.duration_since(last) < self.window);
        if state.busy || within_window {
            debug!("Cooldown active, rejecting");
            return Err(GatewayError::CooldownActive);
        }

        state.busy = true;
        state.last_admission = Some(now);

        let shared = Arc::clone(&self.state);
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut state = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            state.busy = false;
            state.reset_task = None;
        });
        state.reset_task = Some(handle.abort_handle());

        Ok(())
    }

    /// Whether a dispatch is currently in its window
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Abort the pending reset task, if any
    pub fn shutdown(&self) {
        if let Some(handle) = self.lock().reset_task.take() {
            handle.abort();
        }
    }
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_WINDOW_MS))
    }
}
