//! Pipe-Mode Process Spawning
//!
//! Launches a child with stdin/stdout/stderr connected through pipes.
//! Process-group and session setup happens between fork and exec via
//! `pre_exec`, which is also where the caller's after-fork hook runs.

use std::io::Write;
use std::process::{Command, Stdio};

use super::streams::{spawn_reader, OutputChannel};
use crate::error::{Error, Result};
use crate::models::options::{effective_environment, ProcessOptions};

/// A freshly spawned pipe-mode child and its bridged streams
pub(crate) struct PipeChild {
    pub child: std::process::Child,
    pub stdout: OutputChannel,
    pub stderr: OutputChannel,
    pub stdin: Box<dyn Write + Send>,
}

/// Spawn `program` with piped standard streams
pub(crate) fn spawn_pipe_child(
    program: &str,
    args: &[String],
    options: &mut ProcessOptions,
) -> Result<PipeChild> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(env) = effective_environment(
        options.environment.as_ref(),
        options.inherit_environment,
    ) {
        cmd.env_clear();
        cmd.envs(env);
    }

    if let Some(dir) = options.working_dir.as_ref() {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        let new_session = options.detach_session;
        let new_group = options.terminate_children;
        let mut after_fork = options.on_after_fork.take();

        if new_session || new_group || after_fork.is_some() {
            // Runs in the child between fork and exec; must stay
            // async-signal-safe
            unsafe {
                cmd.pre_exec(move || {
                    if new_session {
                        nix::unistd::setsid()
                            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                    } else if new_group {
                        nix::unistd::setpgid(
                            nix::unistd::Pid::from_raw(0),
                            nix::unistd::Pid::from_raw(0),
                        )
                        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                    }
                    if let Some(hook) = after_fork.as_mut() {
                        hook();
                    }
                    Ok(())
                });
            }
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;

        const DETACHED_PROCESS: u32 = 0x0000_0008;
        if options.low_level_console_io {
            warn!("low_level_console_io is not supported; using standard pipes");
        } else if options.detach_process {
            cmd.creation_flags(DETACHED_PROCESS);
        }
    }

    let mut child = cmd.spawn().map_err(|e| Error::LaunchFailed {
        command: program.to_string(),
        reason: e.to_string(),
    })?;

    let stdin = child.stdin.take().ok_or_else(|| Error::LaunchFailed {
        command: program.to_string(),
        reason: "stdin pipe unavailable".to_string(),
    })?;
    let stdout = child.stdout.take().ok_or_else(|| Error::LaunchFailed {
        command: program.to_string(),
        reason: "stdout pipe unavailable".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| Error::LaunchFailed {
        command: program.to_string(),
        reason: "stderr pipe unavailable".to_string(),
    })?;

    debug!("spawned '{}' with pid {}", program, child.id());

    Ok(PipeChild {
        child,
        stdout: spawn_reader("stdout", Box::new(stdout), false),
        stderr: spawn_reader("stderr", Box::new(stderr), false),
        stdin: Box::new(stdin),
    })
}
