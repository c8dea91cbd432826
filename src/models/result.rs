//! Process Result Model
//!
//! Outcome value returned from the synchronous runners and assembled by
//! the completion-callback convenience wiring.

/// Exit status reported when the supervisor terminated the child
pub const EXIT_STATUS_TERMINATED: i32 = 15;

/// Exit status reported when the real status could not be determined
pub const EXIT_STATUS_UNKNOWN: i32 = -1;

/// Collected output and exit status from a completed process
///
/// Exit status domain:
///   0   - successful execution
///   1.. - application defined failure codes
///   15  - process killed by terminate()
///   -1  - unable to determine exit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Standard output collected from the process
    pub stdout: String,

    /// Standard error collected from the process
    pub stderr: String,

    /// Process exit status
    pub exit_status: i32,
}

impl ProcessResult {
    /// Check whether the process exited successfully (exit status 0)
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Check whether the process was killed by the supervisor
    pub fn terminated(&self) -> bool {
        self.exit_status == EXIT_STATUS_TERMINATED
    }
}

impl Default for ProcessResult {
    fn default() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_status: EXIT_STATUS_UNKNOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_defaults_to_unknown_status() {
        let result = ProcessResult::default();
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
        assert_eq!(result.exit_status, EXIT_STATUS_UNKNOWN);
        assert!(!result.success());
    }

    #[test]
    fn test_result_predicates() {
        let ok = ProcessResult {
            stdout: "out".to_string(),
            stderr: String::new(),
            exit_status: 0,
        };
        assert!(ok.success());
        assert!(!ok.terminated());

        let killed = ProcessResult {
            exit_status: EXIT_STATUS_TERMINATED,
            ..Default::default()
        };
        assert!(!killed.success());
        assert!(killed.terminated());
    }
}
