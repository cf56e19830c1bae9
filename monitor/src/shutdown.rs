//! Shutdown flag and signal wiring
//!
//! The run flag is the only state shared between the monitor loop and signal
//! delivery. Signals only ever clear it; the loop notices at its next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

/// Process-wide run flag. Starts out running; cleared once, never set again.
#[derive(Debug, Clone)]
pub struct RunState {
    running: Arc<AtomicBool>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the flag. Returns `true` only for the call that actually
    /// stopped it, so repeated requests are no-ops.
    pub fn request_stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM to `state`.
///
/// Both signals are treated the same. The spawned task clears the flag on
/// every delivery and does nothing else; logging the shutdown is left to the
/// monitor loop. Must be called from within a tokio runtime.
pub fn install_signal_handlers(state: RunState) -> std::io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                received = sigterm.recv() => if received.is_none() { break },
                received = sigint.recv() => if received.is_none() { break },
            }
            state.request_stop();
        }
    }))
}
