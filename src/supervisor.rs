//! Process Supervisor
//!
//! Runs any number of child processes asynchronously and delivers their
//! output and lifecycle events through callbacks. `poll()` must be called
//! periodically (e.g. during standard event pumping / idle time) to check
//! for output and exit status; all callbacks run synchronously inside
//! `poll()` on the calling thread.
//!
//! Output is collected at the polling interval, so two writes to one
//! stream that had an intervening write to another stream may still be
//! delivered concatenated. Per-stream ordering is always preserved.
//!
//! The supervisor assumes a single-threaded driver: the registry is only
//! mutated by `run*`, `poll`, and `terminate_all`. Drive it from multiple
//! threads only with external serialization.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::callbacks::ProcessCallbacks;
use crate::child::ChildHandle;
use crate::error::{Error, Result};
use crate::models::options::ProcessOptions;
use crate::models::result::ProcessResult;

/// Supervisor for asynchronously running child processes
#[derive(Default)]
pub struct ProcessSupervisor {
    /// Live handles in insertion order
    children: Vec<ChildHandle>,
}

impl ProcessSupervisor {
    /// Create a supervisor with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a program asynchronously, invoking callbacks as the process
    /// starts, produces output, and exits.
    ///
    /// The executable is launched directly (no shell metacharacter
    /// expansion); if it is not an absolute path the platform's usual
    /// executable search applies. Returns immediately after the OS spawn;
    /// on spawn failure no handle is registered and no callback fires.
    pub fn run_program(
        &mut self,
        executable: &str,
        args: &[String],
        options: ProcessOptions,
        callbacks: ProcessCallbacks,
    ) -> Result<()> {
        let handle = ChildHandle::launch(executable, args, options, callbacks)?;
        debug!("supervising pid {}", handle.pid());
        self.children.push(handle);
        Ok(())
    }

    /// Run a command asynchronously through the platform command shell
    /// (`/bin/sh -c` on posix, `cmd.exe /C` on Windows), inheriting that
    /// shell's quoting and redirection semantics
    pub fn run_command(
        &mut self,
        command: &str,
        options: ProcessOptions,
        callbacks: ProcessCallbacks,
    ) -> Result<()> {
        if command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }
        let (shell, args) = shell_invocation(command);
        self.run_program(shell, &args, options, callbacks)
    }

    /// Run a program asynchronously, writing `input` to its standard input
    /// (followed by EOF) and invoking `on_completed` with the assembled
    /// [`ProcessResult`] when it exits. The default error policy (log and
    /// terminate) applies.
    pub fn run_program_with_input(
        &mut self,
        executable: &str,
        args: &[String],
        input: &str,
        options: ProcessOptions,
        on_completed: impl FnOnce(ProcessResult) + Send + 'static,
    ) -> Result<()> {
        let callbacks = completion_callbacks(input.to_string(), Box::new(on_completed));
        self.run_program(executable, args, options, callbacks)
    }

    /// Run a shell command asynchronously with `input` on stdin, invoking
    /// `on_completed` with the assembled result on exit
    pub fn run_command_with_input(
        &mut self,
        command: &str,
        input: &str,
        options: ProcessOptions,
        on_completed: impl FnOnce(ProcessResult) + Send + 'static,
    ) -> Result<()> {
        if command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }
        let (shell, args) = shell_invocation(command);
        self.run_program_with_input(shell, &args, input, options, on_completed)
    }

    /// Check whether any children are currently being supervised
    pub fn has_running_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Poll for child output and exit events, advancing every handle by
    /// one step in registry order. Returns true if children remain
    /// supervised after the poll. Safe to call repeatedly and frequently;
    /// with an empty registry it is a no-op returning false.
    pub fn poll(&mut self) -> bool {
        self.children.retain_mut(|child| child.poll());
        !self.children.is_empty()
    }

    /// Request termination of all running children. Does not wait for
    /// them to exit: keep polling (or call [`wait`](Self::wait)) to drive
    /// each handle to its exit callback.
    pub fn terminate_all(&mut self) {
        for child in &mut self.children {
            if let Err(e) = child.terminate() {
                debug!("terminate of pid {} failed: {}", child.pid(), e);
            }
        }
    }

    /// Block until all children have exited, sleeping `polling_interval`
    /// between polls. A `max_wait` of `None` waits unboundedly. Returns
    /// false if the wait timed out with children still supervised.
    pub fn wait(&mut self, polling_interval: Duration, max_wait: Option<Duration>) -> bool {
        let deadline = max_wait.map(|d| Instant::now() + d);
        loop {
            if !self.poll() {
                return true;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return false;
                }
            }
            std::thread::sleep(polling_interval);
        }
    }
}

/// Platform command-shell invocation for `run_command`
fn shell_invocation(command: &str) -> (&'static str, Vec<String>) {
    #[cfg(unix)]
    {
        ("/bin/sh", vec!["-c".to_string(), command.to_string()])
    }
    #[cfg(windows)]
    {
        ("cmd.exe", vec!["/C".to_string(), command.to_string()])
    }
}

/// Wire a callback bag that feeds `input` to stdin, accumulates output,
/// and assembles a [`ProcessResult`] for the completion callback
fn completion_callbacks(
    input: String,
    on_completed: Box<dyn FnOnce(ProcessResult) + Send>,
) -> ProcessCallbacks {
    let stdout = Arc::new(Mutex::new(String::new()));
    let stderr = Arc::new(Mutex::new(String::new()));
    let stdout_on_exit = Arc::clone(&stdout);
    let stderr_on_exit = Arc::clone(&stderr);

    ProcessCallbacks {
        on_started: Some(Box::new(move |ops| {
            // Close stdin after the input so children reading it see EOF
            if let Err(e) = ops.write_to_stdin(input.as_bytes(), true) {
                warn!("failed to write initial stdin: {}; terminating", e);
                let _ = ops.terminate();
            }
        })),
        on_stdout: Some(Box::new(move |_, text| {
            if let Ok(mut collected) = stdout.lock() {
                collected.push_str(text);
            }
        })),
        on_stderr: Some(Box::new(move |_, text| {
            if let Ok(mut collected) = stderr.lock() {
                collected.push_str(text);
            }
        })),
        on_exit: Some(Box::new(move |exit_status| {
            let stdout = stdout_on_exit
                .lock()
                .map(|mut s| std::mem::take(&mut *s))
                .unwrap_or_default();
            let stderr = stderr_on_exit
                .lock()
                .map(|mut s| std::mem::take(&mut *s))
                .unwrap_or_default();
            on_completed(ProcessResult {
                stdout,
                stderr,
                exit_status,
            });
        })),
        ..Default::default()
    }
}
