use std::fmt;

use nix::sys::wait::WaitStatus;

/// Exit code of the last process in a tree, or of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExitStatus(i32);

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    pub const FAILURE: ExitStatus = ExitStatus(1);

    pub fn new(code: i32) -> ExitStatus {
        ExitStatus(code)
    }

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn success(self) -> bool {
        self.0 == 0
    }

    /// `None` for states that are not terminal (stopped, continued, ...).
    /// A child killed by a signal reports `128 + signo`.
    pub fn from_wait_status(status: WaitStatus) -> Option<ExitStatus> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitStatus(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitStatus(128 + signal as i32)),
            _ => None,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
