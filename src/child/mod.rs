//! Child Process Handle
//!
//! Owns one live child: its OS process, stream endpoints (pipes or a PTY
//! master), buffered-but-undelivered output, and the callback set. The
//! handle advances through `Created → Starting → Running → Draining →
//! Exited`; every transition happens inside a supervisor poll step except
//! the jump from Created to Starting, which happens while [`launch`]
//! issues the OS spawn.
//!
//! [`launch`]: ChildHandle::launch

mod pty;
mod spawn;
pub(crate) mod streams;

use chrono::{DateTime, Utc};
use portable_pty::{MasterPty, PtySize};
use std::io::Write;

use crate::callbacks::{ProcessCallbacks, ProcessOperations};
use crate::error::{Error, Result};
use crate::models::options::ProcessOptions;
use crate::models::result::EXIT_STATUS_UNKNOWN;
use crate::platform;
use streams::{OutputChannel, StreamEvent};

/// End-of-transmission byte; delivers EOF to a pty slave the way Ctrl+D does
const VEOF: u8 = 0x04;

/// Lifecycle state of a supervised child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildState {
    /// Handle allocated, OS process not yet spawned
    Created,
    /// Spawn issued; the first poll moves to Running and fires on_started
    Starting,
    /// Normal operation: output delivery, on_continue, exit checks
    Running,
    /// Exit detected; buffered output still being delivered
    Draining,
    /// Terminal: on_exit has fired and the handle can be dropped
    Exited,
}

/// The OS process behind a handle
enum ChildProc {
    Pipe(std::process::Child),
    Pty(Box<dyn portable_pty::Child + Send + Sync>),
}

/// The half of the handle exposed to callbacks as `&mut dyn
/// ProcessOperations`; split out so callbacks can act on the process while
/// the handle iterates its own buffers
pub(crate) struct ChildOps {
    pid: u32,
    /// Process group to signal when terminate_children was requested
    group: Option<u32>,
    stdin: Option<Box<dyn Write + Send>>,
    pty_master: Option<Box<dyn MasterPty + Send>>,
    proc: ChildProc,
    terminate_requested: bool,
}

impl ChildOps {
    /// Non-blocking exit check; reaps the process when it has ended
    fn try_wait(&mut self) -> std::io::Result<Option<i32>> {
        let terminated = self.terminate_requested;
        match &mut self.proc {
            ChildProc::Pipe(child) => Ok(child.try_wait()?.map(map_pipe_exit_status)),
            ChildProc::Pty(child) => Ok(child.try_wait()?.map(|status| {
                // portable-pty does not surface the terminating signal, so
                // a supervisor-initiated terminate reports 15 directly
                if terminated && !status.success() {
                    15
                } else {
                    status.exit_code() as i32
                }
            })),
        }
    }
}

impl ProcessOperations for ChildOps {
    fn write_to_stdin(&mut self, data: &[u8], eof: bool) -> Result<()> {
        let writer = self.stdin.as_mut().ok_or(Error::StdinClosed)?;
        writer.write_all(data)?;
        if eof && self.pty_master.is_some() {
            // A pty has no separate writable half to close; VEOF tells the
            // line discipline to deliver EOF
            writer.write_all(&[VEOF])?;
        }
        writer.flush()?;
        if eof {
            self.stdin = None;
        }
        Ok(())
    }

    fn pty_set_size(&mut self, cols: u16, rows: u16) -> Result<()> {
        let master = self
            .pty_master
            .as_ref()
            .ok_or_else(|| Error::UnsupportedOperation {
                operation: "pty_set_size".to_string(),
            })?;
        master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyResizeFailed {
                reason: e.to_string(),
            })
    }

    fn pty_interrupt(&mut self) -> Result<()> {
        if self.pty_master.is_none() {
            return Err(Error::UnsupportedOperation {
                operation: "pty_interrupt".to_string(),
            });
        }
        // The pty child is its own session leader, so its pid names the
        // foreground process group
        platform::interrupt_group(self.pid)
    }

    fn terminate(&mut self) -> Result<()> {
        self.terminate_requested = true;
        if let Some(group) = self.group {
            platform::terminate_group(group).or_else(|_| platform::terminate(self.pid))
        } else {
            platform::terminate(self.pid)
        }
    }
}

/// One supervised child process
pub(crate) struct ChildHandle {
    state: ChildState,
    ops: ChildOps,
    callbacks: ProcessCallbacks,
    /// stdout pipe or the single pty channel
    stdout: OutputChannel,
    /// stderr pipe; absent in pty mode
    stderr: Option<OutputChannel>,
    pty_mode: bool,
    redirect_stderr_to_stdout: bool,
    /// Accumulated raw pty output for on_console_output_snapshot
    console_buffer: Vec<u8>,
    exit_status: i32,
    started_at: Option<DateTime<Utc>>,
}

impl ChildHandle {
    /// Validate, spawn, and return a handle in the Starting state.
    /// On failure nothing is registered and no callback ever fires.
    pub(crate) fn launch(
        program: &str,
        args: &[String],
        mut options: ProcessOptions,
        callbacks: ProcessCallbacks,
    ) -> Result<Self> {
        if program.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let redirect_stderr_to_stdout = options.redirect_stderr_to_stdout;

        let mut handle = match options.pseudoterminal {
            Some(pty) => {
                if pty.cols == 0 || pty.rows == 0 {
                    return Err(Error::InvalidPtySize {
                        cols: pty.cols,
                        rows: pty.rows,
                    });
                }
                let spawned = pty::spawn_pty_child(program, args, &options, pty)?;
                let pid = spawned.child.process_id().unwrap_or(0);
                Self {
                    state: ChildState::Created,
                    ops: ChildOps {
                        pid,
                        group: options.terminate_children.then_some(pid),
                        stdin: Some(spawned.writer),
                        pty_master: Some(spawned.master),
                        proc: ChildProc::Pty(spawned.child),
                        terminate_requested: false,
                    },
                    callbacks,
                    stdout: spawned.output,
                    stderr: None,
                    pty_mode: true,
                    redirect_stderr_to_stdout,
                    console_buffer: Vec::new(),
                    exit_status: EXIT_STATUS_UNKNOWN,
                    started_at: None,
                }
            }
            None => {
                let spawned = spawn::spawn_pipe_child(program, args, &mut options)?;
                let pid = spawned.child.id();
                Self {
                    state: ChildState::Created,
                    ops: ChildOps {
                        pid,
                        group: options.terminate_children.then_some(pid),
                        stdin: Some(spawned.stdin),
                        pty_master: None,
                        proc: ChildProc::Pipe(spawned.child),
                        terminate_requested: false,
                    },
                    callbacks,
                    stdout: spawned.stdout,
                    stderr: Some(spawned.stderr),
                    pty_mode: false,
                    redirect_stderr_to_stdout,
                    console_buffer: Vec::new(),
                    exit_status: EXIT_STATUS_UNKNOWN,
                    started_at: None,
                }
            }
        };

        // Spawn has been issued; the first poll fires on_started
        handle.state = ChildState::Starting;
        Ok(handle)
    }

    /// OS process id of the child
    pub(crate) fn pid(&self) -> u32 {
        self.ops.pid
    }

    /// Request termination of this child (and its group when
    /// terminate_children was set)
    pub(crate) fn terminate(&mut self) -> Result<()> {
        self.ops.terminate()
    }

    /// Advance this handle by one step: deliver available output, run
    /// lifecycle callbacks, detect exit. Returns false once the handle has
    /// reached Exited and can be removed from the registry.
    pub(crate) fn poll(&mut self) -> bool {
        if self.state == ChildState::Created {
            // Created never escapes launch(); keep the transition total
            self.state = ChildState::Starting;
        }

        if self.state == ChildState::Starting {
            self.state = ChildState::Running;
            self.started_at = Some(Utc::now());
            if let Some(cb) = self.callbacks.on_started.as_mut() {
                cb(&mut self.ops);
            }
        }

        self.deliver_output();

        if self.state == ChildState::Running {
            if let Some(cb) = self.callbacks.on_continue.as_mut() {
                if !cb(&mut self.ops) {
                    if let Err(e) = self.ops.terminate() {
                        debug!(
                            "terminate after on_continue=false failed for pid {}: {}",
                            self.ops.pid, e
                        );
                    }
                }
            }

            match self.ops.try_wait() {
                Ok(Some(status)) => {
                    self.exit_status = status;
                    self.state = ChildState::Draining;
                }
                Ok(None) => {}
                Err(e) => self.handle_io_error(Error::Io(e)),
            }
        }

        if self.state == ChildState::Draining && self.output_drained() {
            self.finalize();
        }

        self.state != ChildState::Exited
    }

    /// Drain every pending output chunk, preserving per-stream order
    fn deliver_output(&mut self) {
        let mut pty_dirty = false;

        while let Some(event) = self.stdout.try_next() {
            match event {
                StreamEvent::Data(chunk) => {
                    if self.pty_mode {
                        self.console_buffer.extend_from_slice(&chunk);
                        pty_dirty = true;
                    }
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    if let Some(cb) = self.callbacks.on_stdout.as_mut() {
                        cb(&mut self.ops, &text);
                    }
                }
                StreamEvent::Failed(e) => self.handle_io_error(Error::Io(e)),
            }
        }

        loop {
            let event = match self.stderr.as_mut() {
                Some(channel) => channel.try_next(),
                None => None,
            };
            let Some(event) = event else { break };
            match event {
                StreamEvent::Data(chunk) => {
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    let cb = if self.redirect_stderr_to_stdout {
                        self.callbacks.on_stdout.as_mut()
                    } else {
                        self.callbacks.on_stderr.as_mut()
                    };
                    if let Some(cb) = cb {
                        cb(&mut self.ops, &text);
                    }
                }
                StreamEvent::Failed(e) => self.handle_io_error(Error::Io(e)),
            }
        }

        if pty_dirty {
            if let Some(cb) = self.callbacks.on_console_output_snapshot.as_mut() {
                cb(&mut self.ops, &self.console_buffer);
            }
        }
    }

    /// Route a stream I/O error to on_error, or apply the default policy:
    /// log and terminate (which drives on_exit with status 15)
    fn handle_io_error(&mut self, err: Error) {
        if let Some(cb) = self.callbacks.on_error.as_mut() {
            cb(&mut self.ops, &err);
        } else {
            warn!(
                "I/O error on child {}: {}; terminating",
                self.ops.pid, err
            );
            if let Err(e) = self.ops.terminate() {
                debug!("terminate after I/O error failed: {}", e);
            }
        }
    }

    fn output_drained(&self) -> bool {
        self.stdout.finished() && self.stderr.as_ref().map_or(true, |s| s.finished())
    }

    /// Fire on_exit exactly once and release owned OS resources
    fn finalize(&mut self) {
        self.state = ChildState::Exited;
        self.ops.stdin = None;
        self.ops.pty_master = None;

        match self.started_at {
            Some(started) => debug!(
                "child {} exited with status {} after {}ms",
                self.ops.pid,
                self.exit_status,
                Utc::now().signed_duration_since(started).num_milliseconds()
            ),
            None => debug!(
                "child {} exited with status {}",
                self.ops.pid, self.exit_status
            ),
        }

        if let Some(cb) = self.callbacks.on_exit.take() {
            cb(self.exit_status);
        }
    }
}

/// Map an OS exit status to the supervisor's exit-status domain: the exit
/// code when the process exited, the terminating signal on unix (SIGTERM
/// becomes 15), -1 when neither is available
fn map_pipe_exit_status(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return signal;
        }
    }
    EXIT_STATUS_UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_rejects_empty_program() {
        let result = ChildHandle::launch(
            "",
            &[],
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        );
        assert!(matches!(result, Err(Error::EmptyCommand)));
    }

    #[test]
    fn test_launch_rejects_zero_pty_size() {
        let options = ProcessOptions {
            pseudoterminal: Some(crate::models::Pseudoterminal::new(0, 24)),
            ..Default::default()
        };
        let result = ChildHandle::launch("echo", &[], options, ProcessCallbacks::default());
        assert!(matches!(result, Err(Error::InvalidPtySize { .. })));
    }

    #[test]
    fn test_launch_nonexistent_program_registers_nothing() {
        let result = ChildHandle::launch(
            "/nonexistent/overseer-test-binary",
            &[],
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        );
        assert!(matches!(result, Err(Error::LaunchFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_child_runs_to_exit() {
        let mut handle = ChildHandle::launch(
            "/bin/echo",
            &["hello".to_string()],
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        )
        .expect("echo should spawn");

        assert!(handle.pid() > 0);

        let mut polls = 0;
        while handle.poll() {
            polls += 1;
            assert!(polls < 1000, "child never reached Exited");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(handle.state, ChildState::Exited);
        assert_eq!(handle.exit_status, 0);
    }

    /// Reader whose stream fails immediately, standing in for a broken pipe
    struct FailingReader;
    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated failure",
            ))
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_default_error_policy_terminates_the_child() {
        let mut handle = ChildHandle::launch(
            "/bin/sleep",
            &["30".to_string()],
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        )
        .expect("sleep should spawn");

        // Swap in a stream that fails on the first read; with no on_error
        // handler the failure must log, terminate, and drive on_exit(15)
        handle.stdout = streams::spawn_reader("stdout", Box::new(FailingReader), false);

        let mut polls = 0;
        while handle.poll() {
            polls += 1;
            assert!(polls < 1000, "child never reached Exited");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(handle.state, ChildState::Exited);
        assert_eq!(handle.exit_status, 15);
    }

    #[cfg(unix)]
    #[test]
    fn test_on_error_handler_suppresses_the_default_terminate() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let errors = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&errors);
        let callbacks = ProcessCallbacks {
            on_error: Some(Box::new(move |_, _| {
                observed.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };

        let mut handle = ChildHandle::launch(
            "/bin/sleep",
            &["0.3".to_string()],
            ProcessOptions::default(),
            callbacks,
        )
        .expect("sleep should spawn");

        handle.stdout = streams::spawn_reader("stdout", Box::new(FailingReader), false);

        let mut polls = 0;
        while handle.poll() {
            polls += 1;
            assert!(polls < 1000, "child never reached Exited");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        // The handler absorbed the error, so the child ran to completion
        assert_eq!(handle.exit_status, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_pty_operations_rejected_without_pty() {
        let mut handle = ChildHandle::launch(
            "/bin/cat",
            &[],
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        )
        .expect("cat should spawn");

        assert!(matches!(
            handle.ops.pty_set_size(120, 40),
            Err(Error::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            handle.ops.pty_interrupt(),
            Err(Error::UnsupportedOperation { .. })
        ));

        handle.terminate().expect("terminate should succeed");
        while handle.poll() {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(handle.exit_status, 15);
    }
}
