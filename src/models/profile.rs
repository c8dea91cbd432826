//! Launch Profiles
//!
//! Serializable description of a session launch: who runs what, with which
//! process configuration. Profiles round-trip through JSON without losing
//! any field consumed by process creation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::options::ProcessOptions;

/// Process-configuration subset of a launch profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variable overrides (`None` inherits unchanged)
    #[serde(default)]
    pub environment: Option<HashMap<String, String>>,

    /// Merge overrides with the inherited environment rather than
    /// replacing it
    #[serde(default = "default_true")]
    pub inherit_environment: bool,

    /// Working directory for the child
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Place the child in its own process group so terminate() takes down
    /// its subprocesses as well
    #[serde(default)]
    pub terminate_children: bool,

    /// Detach the child into its own session (posix `setsid`)
    #[serde(default)]
    pub detach_session: bool,

    /// Deliver standard error through the standard output stream
    #[serde(default)]
    pub redirect_stderr_to_stdout: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            environment: None,
            inherit_environment: true,
            working_dir: None,
            terminate_children: false,
            detach_session: false,
            redirect_stderr_to_stdout: false,
        }
    }
}

/// A session launch profile: user, executable, and process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchProfile {
    /// User the session runs as
    pub username: String,

    /// Absolute path of the executable to launch
    pub executable_path: PathBuf,

    /// Process configuration for the launch
    #[serde(default)]
    pub config: LaunchConfig,
}

impl LaunchProfile {
    /// Serialize the profile to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a profile from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build [`ProcessOptions`] from this profile's configuration
    pub fn to_options(&self) -> ProcessOptions {
        ProcessOptions {
            environment: self.config.environment.clone(),
            inherit_environment: self.config.inherit_environment,
            working_dir: self.config.working_dir.clone(),
            terminate_children: self.config.terminate_children,
            detach_session: self.config.detach_session,
            redirect_stderr_to_stdout: self.config.redirect_stderr_to_stdout,
            ..ProcessOptions::default()
        }
    }
}
