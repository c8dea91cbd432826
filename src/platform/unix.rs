//! Unix signal operations

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

use crate::error::{Error, Result};

/// Send SIGTERM to a single process
pub(crate) fn terminate(pid: u32) -> Result<()> {
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| Error::SignalSendFailed {
        signal: "SIGTERM".to_string(),
        reason: e.to_string(),
    })
}

/// Send SIGTERM to an entire process group
pub(crate) fn terminate_group(pgid: u32) -> Result<()> {
    killpg(Pid::from_raw(pgid as i32), Signal::SIGTERM).map_err(|e| Error::SignalSendFailed {
        signal: "SIGTERM".to_string(),
        reason: e.to_string(),
    })
}

/// Send SIGINT to an entire process group (Ctrl+C equivalent)
pub(crate) fn interrupt_group(pgid: u32) -> Result<()> {
    killpg(Pid::from_raw(pgid as i32), Signal::SIGINT).map_err(|e| Error::SignalSendFailed {
        signal: "SIGINT".to_string(),
        reason: e.to_string(),
    })
}
