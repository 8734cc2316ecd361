use super::config::Config;
use super::exec::{BuiltinHandler, ExitStatus};
use super::history::History;

pub mod builtins;
use self::builtins::Builtins;

/// Everything a line can change that outlives the line itself.
pub struct ShellState {
    history: History,
    builtins: Builtins,
    last_status: ExitStatus,
    exit_request: Option<ExitStatus>,
}

impl ShellState {
    pub fn new(config: &Config) -> Self {
        ShellState {
            history: History::new(config.history_size()),
            builtins: Builtins::with_defaults(),
            last_status: ExitStatus::SUCCESS,
            exit_request: None,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    pub fn last_status(&self) -> ExitStatus {
        self.last_status
    }

    pub fn set_last_status(&mut self, status: ExitStatus) {
        self.last_status = status;
    }

    pub fn request_exit(&mut self, status: ExitStatus) {
        self.exit_request = Some(status);
    }

    /// Set once `exit` has run in the shell process.
    pub fn exit_requested(&self) -> Option<ExitStatus> {
        self.exit_request
    }
}

impl BuiltinHandler for ShellState {
    fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }

    fn run_builtin(&mut self, argv: &[String]) -> ExitStatus {
        let handler = argv.first().and_then(|name| self.builtins.get(name));
        match handler {
            Some(handler) => handler(self, argv),
            None => ExitStatus::FAILURE,
        }
    }
}
