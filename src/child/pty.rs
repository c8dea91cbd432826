//! PTY-Mode Process Spawning
//!
//! Launches a child attached to a pseudoterminal using the portable-pty
//! crate. In PTY mode there is a single bidirectional channel: the child's
//! stdout and stderr both arrive through the master, and stdin is written
//! to the master as terminal input.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::Write;

use super::streams::{spawn_reader, OutputChannel};
use crate::error::{Error, Result};
use crate::models::options::{effective_environment, ProcessOptions, Pseudoterminal};

/// A freshly spawned PTY-mode child: process, master side, and bridged I/O
pub(crate) struct PtyChild {
    pub child: Box<dyn Child + Send + Sync>,
    pub master: Box<dyn MasterPty + Send>,
    pub output: OutputChannel,
    pub writer: Box<dyn Write + Send>,
}

/// Spawn `program` on a new pseudoterminal of the requested size
pub(crate) fn spawn_pty_child(
    program: &str,
    args: &[String],
    options: &ProcessOptions,
    pty: Pseudoterminal,
) -> Result<PtyChild> {
    let pty_system = native_pty_system();

    let pair = pty_system
        .openpty(PtySize {
            rows: pty.rows,
            cols: pty.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| Error::PtyCreationFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

    let mut cmd = CommandBuilder::new(program);
    cmd.args(args);

    if let Some(env) = effective_environment(
        options.environment.as_ref(),
        options.inherit_environment,
    ) {
        cmd.env_clear();
        for (key, value) in env {
            cmd.env(key, value);
        }
    }

    if let Some(dir) = options.working_dir.as_ref() {
        cmd.cwd(dir);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| Error::LaunchFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

    // The slave side lives on in the child; keeping it open here would
    // hold the pty open after the child exits
    drop(pair.slave);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| Error::PtyCreationFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| Error::PtyCreationFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

    debug!(
        "spawned '{}' on a {}x{} pty with pid {:?}",
        program,
        pty.cols,
        pty.rows,
        child.process_id()
    );

    Ok(PtyChild {
        child,
        master: pair.master,
        output: spawn_reader("pty", reader, true),
        writer,
    })
}
