//! Process Callbacks and Operations
//!
//! [`ProcessOperations`] is the capability surface a running child exposes
//! back to its callbacks: it is the only way callback code can act on the
//! owning process. [`ProcessCallbacks`] is a bag of optional event handlers;
//! an absent handler is a no-op, except `on_error` whose default policy is
//! to log and terminate the child.
//!
//! All callbacks are invoked synchronously from within a supervisor
//! `poll()` step, on the thread that called `poll()`. Callbacks must not
//! block: a blocked callback stalls output delivery for every other
//! supervised child in that step.

use crate::error::{Error, Result};

/// Operations that can be performed on a running child from within
/// [`ProcessCallbacks`]
pub trait ProcessOperations {
    /// Write (synchronously) to standard input. If `eof` is true the input
    /// channel is closed after the write, signalling end-of-input to the
    /// child. Fails once the channel is closed or the process has exited.
    fn write_to_stdin(&mut self, data: &[u8], eof: bool) -> Result<()>;

    /// Resize the pseudoterminal and notify the child (window-size-changed).
    /// Only available if the process was started with
    /// [`ProcessOptions::pseudoterminal`](crate::ProcessOptions::pseudoterminal).
    fn pty_set_size(&mut self, cols: u16, rows: u16) -> Result<()>;

    /// Send an interrupt to the foreground process group of the
    /// pseudoterminal. Only available in PTY mode.
    fn pty_interrupt(&mut self) -> Result<()>;

    /// Request process termination (SIGTERM or platform equivalent). If
    /// `terminate_children` was set at launch the whole process group is
    /// terminated. Termination is asynchronous: the handle reaches its
    /// exit callback on a subsequent poll, with exit status 15.
    fn terminate(&mut self) -> Result<()>;
}

/// Handler invoked after the process begins running
pub type StartedFn = Box<dyn FnMut(&mut dyn ProcessOperations) + Send>;

/// Handler polled periodically; returning false terminates the child
pub type ContinueFn = Box<dyn FnMut(&mut dyn ProcessOperations) -> bool + Send>;

/// Streaming handler for stdout/stderr text
pub type OutputFn = Box<dyn FnMut(&mut dyn ProcessOperations, &str) + Send>;

/// Handler receiving the accumulated raw PTY buffer
pub type SnapshotFn = Box<dyn FnMut(&mut dyn ProcessOperations, &[u8]) + Send>;

/// Handler for I/O errors on the child's streams
pub type ErrorFn = Box<dyn FnMut(&mut dyn ProcessOperations, &Error) + Send>;

/// Handler invoked exactly once after the process has exited
pub type ExitFn = Box<dyn FnOnce(i32) + Send>;

/// Optional event handlers for one supervised child
///
/// Per-child delivery order: `on_started`, then interleaved
/// `on_stdout`/`on_stderr`/`on_continue` (per-stream order preserved),
/// then `on_error` if any, then `on_exit` exactly once, always last.
#[derive(Default)]
pub struct ProcessCallbacks {
    /// Called during the first poll after the process begins running (and
    /// therefore after the run call returns). Useful for writing initial
    /// standard input to the child.
    pub on_started: Option<StartedFn>,

    /// Called at every poll during the lifetime of the child (not before
    /// `on_started`). Returning false terminates the child.
    pub on_continue: Option<ContinueFn>,

    /// Streaming callback for standard output
    pub on_stdout: Option<OutputFn>,

    /// Streaming callback for standard error
    pub on_stderr: Option<OutputFn>,

    /// Snapshot of the accumulated raw console buffer (PTY mode); delivered
    /// after any poll that produced new output
    pub on_console_output_snapshot: Option<SnapshotFn>,

    /// Called if an I/O error occurs while reading the child's streams.
    /// When unset the error is logged and the child terminated, which
    /// results in `on_exit` firing with exit status 15.
    pub on_error: Option<ErrorFn>,

    /// Called exactly once after the process has exited and all buffered
    /// output has been delivered
    pub on_exit: Option<ExitFn>,
}

impl ProcessCallbacks {
    /// Create an empty callback bag (every event is a no-op)
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for ProcessCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessCallbacks")
            .field("on_started", &self.on_started.is_some())
            .field("on_continue", &self.on_continue.is_some())
            .field("on_stdout", &self.on_stdout.is_some())
            .field("on_stderr", &self.on_stderr.is_some())
            .field(
                "on_console_output_snapshot",
                &self.on_console_output_snapshot.is_some(),
            )
            .field("on_error", &self.on_error.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}
