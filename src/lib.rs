//! Overseer - cooperative child-process supervision
//!
//! Overseer launches external programs, multiplexes their standard
//! input/output/error streams (optionally through a pseudoterminal), and
//! delivers lifecycle and output events through callbacks - all without
//! blocking the host application's main loop.
//!
//! ## Module Organization
//!
//! - [`supervisor`] - the [`ProcessSupervisor`]: run/poll/terminate/wait
//! - [`callbacks`] - [`ProcessCallbacks`] and the [`ProcessOperations`]
//!   capability surface exposed to them
//! - [`models`] - launch options, results, and JSON launch profiles
//! - [`run`] - synchronous single-shot runners
//! - [`mod@error`] - error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use overseer::{ProcessCallbacks, ProcessOptions, ProcessSupervisor};
//!
//! # fn main() -> overseer::Result<()> {
//! let mut supervisor = ProcessSupervisor::new();
//!
//! let callbacks = ProcessCallbacks {
//!     on_stdout: Some(Box::new(|_ops, text| print!("{}", text))),
//!     on_exit: Some(Box::new(|status| println!("exited: {}", status))),
//!     ..Default::default()
//! };
//! supervisor.run_program("ls", &["-l".to_string()], ProcessOptions::default(), callbacks)?;
//!
//! // Pump from the host event loop (or idle-time hook)
//! while supervisor.poll() {
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Overseer uses a cooperative polling model:
//!
//! - **Driver thread:** calls `poll()`; all supervisor state transitions
//!   and callback invocations happen here, synchronously
//! - **Reader threads:** one per child stream, bridging blocking pipe/PTY
//!   reads into channels the poll step drains without blocking
//!
//! Polling bounds output latency by the polling interval and means two
//! writes to one stream may be delivered coalesced; per-stream ordering
//! is always preserved. `wait()` is the only blocking call, and it blocks
//! only the calling thread between polls.
//!
//! Every successfully launched child delivers exactly one `on_started`
//! and exactly one `on_exit` (always last), regardless of which error
//! path was taken in between.

#[macro_use]
extern crate tracing;

pub mod callbacks;
pub mod error;
pub mod models;
pub mod run;
pub mod supervisor;

mod child;
mod platform;

// Re-exports for core functionality
pub use callbacks::{ProcessCallbacks, ProcessOperations};
pub use error::{Error, Result};
pub use models::{LaunchConfig, LaunchProfile, ProcessOptions, ProcessResult, Pseudoterminal};
pub use supervisor::ProcessSupervisor;

/// The current version of Overseer from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
