//! Output Stream Bridging
//!
//! Bridges blocking pipe/PTY reads to the non-blocking poll loop: one
//! reader thread per stream pushes chunks into an unbounded channel, and
//! the poll step drains the channel with `try_recv`. A disconnected channel
//! marks end-of-stream; read failures travel through the channel so they
//! reach the error callback instead of dying in the thread.

use std::io::Read;
use std::thread;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// One event read from a child's output stream
pub(crate) enum StreamEvent {
    /// A chunk of output in the order it was produced
    Data(Vec<u8>),
    /// A non-recoverable read error; the stream ends after this
    Failed(std::io::Error),
}

/// Non-blocking consumer side of one bridged output stream
pub(crate) struct OutputChannel {
    rx: UnboundedReceiver<StreamEvent>,
    finished: bool,
}

impl OutputChannel {
    /// Take the next pending event, if any, without blocking
    pub(crate) fn try_next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                None
            }
        }
    }

    /// True once the stream has hit EOF (or failed) and every buffered
    /// chunk has been taken
    pub(crate) fn finished(&self) -> bool {
        self.finished
    }
}

/// Spawn a reader thread that forwards `reader` into an [`OutputChannel`].
///
/// With `eio_is_eof` set (PTY masters), an EIO read error is treated as
/// end-of-stream: on Linux the master returns EIO once the child has
/// exited and the slave side is closed, which is normal shutdown rather
/// than an error worth reporting.
pub(crate) fn spawn_reader(
    stream: &'static str,
    mut reader: Box<dyn Read + Send>,
    eio_is_eof: bool,
) -> OutputChannel {
    let (tx, rx) = unbounded_channel::<StreamEvent>();

    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    // EOF - stream closed by the child
                    debug!("{} reader reached EOF", stream);
                    break;
                }
                Ok(n) => {
                    if tx.send(StreamEvent::Data(buf[..n].to_vec())).is_err() {
                        debug!("{} reader: receiver dropped, stopping", stream);
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(std::time::Duration::from_millis(10));
                    continue;
                }
                Err(e) if eio_is_eof && e.raw_os_error() == Some(EIO) => {
                    debug!("{} reader: slave side closed, treating as EOF", stream);
                    break;
                }
                Err(e) => {
                    warn!("{} reader error ({}): {}", stream, e.kind(), e);
                    let _ = tx.send(StreamEvent::Failed(e));
                    break;
                }
            }
        }
    });

    OutputChannel { rx, finished: false }
}

/// errno for an I/O error on a pty master whose slave has gone away
const EIO: i32 = 5;
