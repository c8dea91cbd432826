//! Platform-specific process control
//!
//! Signal delivery and process-group termination differ per OS; the child
//! handle only ever talks to the functions re-exported here.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::{interrupt_group, terminate, terminate_group};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::{interrupt_group, terminate, terminate_group};
