use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use log::debug;

use super::ShellState;
use crate::shell::exec::ExitStatus;

pub type BuiltinFn = fn(&mut ShellState, &[String]) -> ExitStatus;

/// Name to handler table consulted before looking for an executable.
#[derive(Clone, Default)]
pub struct Builtins {
    table: HashMap<&'static str, BuiltinFn>,
}

impl Builtins {
    pub fn new() -> Builtins {
        Builtins {
            table: HashMap::new(),
        }
    }

    /// `cd`, `exit` and `history`.
    pub fn with_defaults() -> Builtins {
        let mut builtins = Builtins::new();
        builtins.register("cd", cd);
        builtins.register("exit", exit);
        builtins.register("history", history);
        builtins
    }

    pub fn register(&mut self, name: &'static str, handler: BuiltinFn) {
        self.table.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

fn cd(_state: &mut ShellState, argv: &[String]) -> ExitStatus {
    let target = match argv.get(1) {
        Some(dir) => PathBuf::from(dir),
        None => match env::var_os("HOME") {
            Some(home) => PathBuf::from(home),
            None => {
                eprintln!("cd: HOME not set");
                return ExitStatus::FAILURE;
            }
        },
    };
    match env::set_current_dir(&target) {
        Ok(()) => {
            debug!("changed directory to {}", target.display());
            ExitStatus::SUCCESS
        }
        Err(e) => {
            eprintln!("cd: {}: {}", target.display(), e);
            ExitStatus::FAILURE
        }
    }
}

fn exit(state: &mut ShellState, argv: &[String]) -> ExitStatus {
    let status = match argv.get(1) {
        Some(arg) => match arg.parse::<i32>() {
            Ok(code) => ExitStatus::new(code),
            Err(_) => {
                eprintln!("exit: {}: numeric argument required", arg);
                ExitStatus::new(2)
            }
        },
        None => state.last_status(),
    };
    state.request_exit(status);
    status
}

fn history(state: &mut ShellState, argv: &[String]) -> ExitStatus {
    match argv.get(1).map(String::as_str) {
        None => {
            println!("Past Inputs:");
            for line in state.history() {
                println!("- {}", line);
            }
            ExitStatus::SUCCESS
        }
        Some("clear") => {
            state.history_mut().clear();
            ExitStatus::SUCCESS
        }
        Some(other) => {
            eprintln!("history: {}: unknown option", other);
            ExitStatus::new(2)
        }
    }
}
