//! Data Models
//!
//! Value objects passed across the supervision boundary: launch options,
//! process results, and serializable launch profiles.

pub mod options;
pub mod profile;
pub mod result;

// Re-exports for convenience
pub use options::{ProcessOptions, Pseudoterminal};
pub use profile::{LaunchConfig, LaunchProfile};
pub use result::ProcessResult;
