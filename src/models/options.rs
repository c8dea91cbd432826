//! Process Launch Options
//!
//! Immutable configuration snapshot for one launch. Options are consumed
//! by value by the run calls; once a child is running its configuration
//! cannot change.

use std::collections::HashMap;
use std::path::PathBuf;

/// Pseudoterminal request: attach the child to a PTY of the given size
/// instead of three separate pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pseudoterminal {
    /// Terminal width in columns
    pub cols: u16,
    /// Terminal height in rows
    pub rows: u16,
}

impl Pseudoterminal {
    /// Create a pseudoterminal request with the given dimensions
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for Pseudoterminal {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Hook executed in the child after fork, before exec (posix only)
#[cfg(unix)]
pub type AfterForkFn = Box<dyn FnMut() + Send + Sync + 'static>;

/// Configuration for one process launch
pub struct ProcessOptions {
    /// Environment variables to set for the child. `None` inherits the
    /// parent environment unchanged.
    pub environment: Option<HashMap<String, String>>,

    /// When `environment` is set: merge it over the inherited environment
    /// (true) or use it as the complete environment (false)
    pub inherit_environment: bool,

    /// Working directory for the child
    pub working_dir: Option<PathBuf>,

    /// Place the child in its own process group (`setpgid(0, 0)` on posix)
    /// so that terminate() takes down the child and all of its
    /// subprocesses via a negative-pid kill
    pub terminate_children: bool,

    /// Call `setsid` after fork on posix (no effect on Windows)
    pub detach_session: bool,

    /// Deliver standard error through the standard output callback
    pub redirect_stderr_to_stdout: bool,

    /// Attach the child to a pseudoterminal instead of pipes. In PTY mode
    /// there is no separate stderr stream.
    pub pseudoterminal: Option<Pseudoterminal>,

    /// Run within the child immediately after the fork (posix only)
    #[cfg(unix)]
    pub on_after_fork: Option<AfterForkFn>,

    /// Create the process with DETACHED_PROCESS on Win32 (no effect on posix)
    #[cfg(windows)]
    pub detach_process: bool,

    /// Capture low-level console input/output that cannot be accessed by
    /// redirecting stdin/stdout (Win32 only; ignores `detach_process` and
    /// `redirect_stderr_to_stdout` when set)
    #[cfg(windows)]
    pub low_level_console_io: bool,
}

impl ProcessOptions {
    /// Create options with all defaults (inherit environment, no PTY,
    /// no flags set)
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            environment: None,
            inherit_environment: true,
            working_dir: None,
            terminate_children: false,
            detach_session: false,
            redirect_stderr_to_stdout: false,
            pseudoterminal: None,
            #[cfg(unix)]
            on_after_fork: None,
            #[cfg(windows)]
            detach_process: false,
            #[cfg(windows)]
            low_level_console_io: false,
        }
    }
}

impl std::fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ProcessOptions");
        s.field("environment", &self.environment)
            .field("inherit_environment", &self.inherit_environment)
            .field("working_dir", &self.working_dir)
            .field("terminate_children", &self.terminate_children)
            .field("detach_session", &self.detach_session)
            .field("redirect_stderr_to_stdout", &self.redirect_stderr_to_stdout)
            .field("pseudoterminal", &self.pseudoterminal);
        #[cfg(unix)]
        s.field("on_after_fork", &self.on_after_fork.is_some());
        s.finish()
    }
}

/// Compute the effective environment for a launch from an optional
/// override map and the inherit flag
pub(crate) fn effective_environment(
    overrides: Option<&HashMap<String, String>>,
    inherit: bool,
) -> Option<HashMap<String, String>> {
    let overrides = overrides?;

    let mut env = if inherit {
        std::env::vars().collect()
    } else {
        HashMap::new()
    };

    for (key, value) in overrides {
        env.insert(key.clone(), value.clone());
    }

    Some(env)
}
