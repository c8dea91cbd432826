//! Windows process termination
//!
//! Windows has no process groups in the posix sense; group operations
//! report a signal-send failure and callers fall back to single-process
//! termination.

use windows_sys::Win32::Foundation::CloseHandle;
use windows_sys::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

use crate::error::{Error, Result};

/// Forcibly terminate a single process
pub(crate) fn terminate(pid: u32) -> Result<()> {
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            return Err(Error::SignalSendFailed {
                signal: "TerminateProcess".to_string(),
                reason: format!("OpenProcess failed for pid {}", pid),
            });
        }
        let ok = TerminateProcess(handle, 15);
        CloseHandle(handle);
        if ok == 0 {
            return Err(Error::SignalSendFailed {
                signal: "TerminateProcess".to_string(),
                reason: format!("TerminateProcess failed for pid {}", pid),
            });
        }
    }
    Ok(())
}

/// Process-group termination is not available on Windows
pub(crate) fn terminate_group(pgid: u32) -> Result<()> {
    let _ = pgid;
    Err(Error::SignalSendFailed {
        signal: "SIGTERM".to_string(),
        reason: "process groups are not supported on Windows".to_string(),
    })
}

/// Process-group interrupt is not available on Windows
pub(crate) fn interrupt_group(pgid: u32) -> Result<()> {
    let _ = pgid;
    Err(Error::SignalSendFailed {
        signal: "SIGINT".to_string(),
        reason: "process groups are not supported on Windows".to_string(),
    })
}
