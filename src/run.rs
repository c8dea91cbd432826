//! Synchronous Runners
//!
//! Single-shot convenience wrappers: each runs one child by driving a
//! private [`ProcessSupervisor`] to completion and returns the collected
//! [`ProcessResult`]. For anything beyond run-to-completion semantics use
//! the supervisor directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::Result;
use crate::models::options::ProcessOptions;
use crate::models::result::ProcessResult;
use crate::supervisor::ProcessSupervisor;

/// Interval between polls while waiting for the single child
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run a program synchronously with `input` on its standard input and
/// collect its output and exit status.
///
/// The executable is launched directly; shell metacharacters in the
/// arguments are not interpreted.
pub fn run_program(
    executable: &str,
    args: &[String],
    input: &str,
    options: ProcessOptions,
) -> Result<ProcessResult> {
    let mut supervisor = ProcessSupervisor::new();
    let slot = Arc::new(Mutex::new(None));
    let completion_slot = Arc::clone(&slot);

    supervisor.run_program_with_input(executable, args, input, options, move |result| {
        if let Ok(mut slot) = completion_slot.lock() {
            *slot = Some(result);
        }
    })?;

    supervisor.wait(POLL_INTERVAL, None);
    Ok(take_result(&slot))
}

/// Run a command synchronously through the platform command shell
pub fn run_command(command: &str, options: ProcessOptions) -> Result<ProcessResult> {
    run_command_with_input(command, "", options)
}

/// Run a shell command synchronously with `input` on its standard input
pub fn run_command_with_input(
    command: &str,
    input: &str,
    options: ProcessOptions,
) -> Result<ProcessResult> {
    let mut supervisor = ProcessSupervisor::new();
    let slot = Arc::new(Mutex::new(None));
    let completion_slot = Arc::clone(&slot);

    supervisor.run_command_with_input(command, input, options, move |result| {
        if let Ok(mut slot) = completion_slot.lock() {
            *slot = Some(result);
        }
    })?;

    supervisor.wait(POLL_INTERVAL, None);
    Ok(take_result(&slot))
}

fn take_result(slot: &Arc<Mutex<Option<ProcessResult>>>) -> ProcessResult {
    slot.lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_default()
}
