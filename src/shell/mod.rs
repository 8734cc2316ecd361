pub mod config;
pub mod exec;
pub mod history;
pub mod readline;
pub mod state;
pub mod syntax;

use std::io::{self, BufRead, Write};

use log::{debug, warn};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use thiserror::Error;

use self::config::Config;
use self::exec::{ExecError, ExitStatus, ProcessEnvironment};
use self::readline::Readline;
use self::state::ShellState;
use self::syntax::ParseError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl ShellError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::Parse(_) => 2,
            ShellError::Exec(e) => e.exit_code(),
        }
    }
}

/// Ignores the given signals for as long as it lives, then puts the old
/// dispositions back.
struct IgnoredSignals {
    previous: Vec<(Signal, SigAction)>,
}

impl IgnoredSignals {
    fn new(signals: &[Signal]) -> nix::Result<IgnoredSignals> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let mut previous = Vec::with_capacity(signals.len());
        for signal in signals {
            let old = unsafe { sigaction(*signal, &ignore)? };
            previous.push((*signal, old));
        }
        Ok(IgnoredSignals { previous })
    }
}

impl Drop for IgnoredSignals {
    fn drop(&mut self) {
        for (signal, action) in self.previous.drain(..).rev() {
            unsafe {
                if let Err(e) = sigaction(signal, &action) {
                    warn!("failed to restore {:?}: {}", signal, e);
                }
            }
        }
    }
}

pub struct Shell {
    state: ShellState,
    config: Config,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell {
            state: ShellState::new(&config),
            config,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    /// Parse and execute one line. The tree and its arena are dropped before
    /// this returns, on success and on error alike.
    pub fn eval(&mut self, line: &str) -> Result<ExitStatus, ShellError> {
        let ast = syntax::parse(line)?;
        debug!("executing {}", ast);
        let status = exec::execute(&ast, &ProcessEnvironment, &mut self.state)?;
        Ok(status)
    }

    /// Run a line the way the prompt does: record it, report any error on
    /// stderr and remember the resulting status. Never ends the session by
    /// itself; check `exit_requested` afterwards.
    pub fn run_line(&mut self, line: &str) -> ExitStatus {
        self.state.history_mut().add(line);
        let status = match self.eval(line) {
            Ok(status) => status,
            Err(ShellError::Parse(ParseError::EmptyInput)) => return self.state.last_status(),
            Err(error) => {
                eprintln!("eggshell: {}", error);
                ExitStatus::new(error.exit_code())
            }
        };
        self.state.set_last_status(status);
        status
    }

    pub fn exit_requested(&self) -> Option<ExitStatus> {
        self.state.exit_requested()
    }

    /// Run every line of `input` in order, stopping early at `exit`.
    pub fn run_script<R: BufRead>(&mut self, input: R) -> io::Result<ExitStatus> {
        for line in input.lines() {
            let line = line?;
            self.run_line(&line);
            if let Some(status) = self.exit_requested() {
                return Ok(status);
            }
        }
        Ok(self.state.last_status())
    }

    pub fn run_interactive(&mut self) -> io::Result<ExitStatus> {
        let _ignored = IgnoredSignals::new(&[Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP])
            .map_err(io::Error::from)?;
        if self.config.clear_screen() {
            print!("{}{}", termion::clear::All, termion::cursor::Goto(1, 1));
            io::stdout().flush()?;
        }
        let mut readline = Readline::new(self.config.color());
        loop {
            match readline.read(self.state.history())? {
                Some(line) => {
                    self.run_line(&line);
                    if let Some(status) = self.exit_requested() {
                        return Ok(status);
                    }
                }
                None => return Ok(self.state.last_status()),
            }
        }
    }
}
