//! Runs a parsed line by forking and wiring together processes.

use std::collections::HashMap;
use std::env;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::Path;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{self, close, dup2, execv, fork, ForkResult, Pid};
use thiserror::Error;

mod path;
mod redirect;
mod status;

pub use self::path::find_executable;
pub use self::redirect::Redirect;
pub use self::status::ExitStatus;

use super::syntax::{Ast, Direction, Node, NodeId};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{0}: not executable")]
    NotExecutable(String),
    #[error("command name expanded to nothing")]
    EmptyCommandName,
    #[error("{path}: {source}")]
    RedirectionOpenFailed {
        path: String,
        #[source]
        source: nix::Error,
    },
    #[error("fork failed: {0}")]
    Spawn(#[source] nix::Error),
    #[error("pipe failed: {0}")]
    Pipe(#[source] nix::Error),
    #[error("wait failed: {0}")]
    Wait(#[source] nix::Error),
    #[error("could not rebind file descriptor: {0}")]
    Descriptor(#[source] nix::Error),
    #[error("{path}: {source}")]
    Exec {
        path: String,
        #[source]
        source: nix::Error,
    },
    #[error("argument contains a NUL byte: {0:?}")]
    InvalidArgument(String),
}

impl ExecError {
    /// Status reported for this error, following the usual shell conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::CommandNotFound(_) => 127,
            ExecError::NotExecutable(_) | ExecError::Exec { .. } => 126,
            _ => 1,
        }
    }
}

/// Where environment references and the executable search path are read from.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Commands that run inside the shell process instead of being spawned.
pub trait BuiltinHandler {
    fn is_builtin(&self, name: &str) -> bool;
    /// `argv[0]` is the builtin's own name.
    fn run_builtin(&mut self, argv: &[String]) -> ExitStatus;
}

pub(crate) fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

fn reset_signal_dispositions() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for signal in &[Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP, Signal::SIGPIPE] {
        unsafe {
            let _ = sigaction(*signal, &default);
        }
    }
}

/// Fork, run `body` in the new process and exit with the code it returns.
fn fork_child<F>(body: F) -> Result<Pid, ExecError>
where
    F: FnOnce() -> i32,
{
    flush_std_streams();
    match unsafe { fork() }.map_err(ExecError::Spawn)? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            let code = body();
            flush_std_streams();
            unsafe { libc::_exit(code) }
        }
    }
}

fn wait_for(pid: Pid) -> Result<ExitStatus, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(exit) = ExitStatus::from_wait_status(status) {
                    debug!("{} finished with {}", pid, exit);
                    return Ok(exit);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}

/// A resolved executable with its argument vector, ready for `execv`.
struct Program {
    path: CString,
    argv: Vec<CString>,
}

impl Program {
    fn new(path: &Path, argv: &[String]) -> Result<Program, ExecError> {
        let path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| ExecError::InvalidArgument(path.display().to_string()))?;
        let argv = argv
            .iter()
            .map(|arg| CString::new(arg.as_str()).map_err(|_| ExecError::InvalidArgument(arg.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Program { path, argv })
    }

    /// Replace the current process image. Only returns if that failed.
    fn exec(&self) -> ExecError {
        reset_signal_dispositions();
        match execv(&self.path, &self.argv) {
            Ok(never) => match never {},
            Err(source) => ExecError::Exec {
                path: self.path.to_string_lossy().into_owned(),
                source,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Running in the shell itself, so external commands need a child.
    Shell,
    /// Running in a forked pipeline side that can be replaced outright.
    Subprocess,
}

struct Executor<'a, E: ?Sized, B: ?Sized> {
    ast: &'a Ast,
    env: &'a E,
    builtins: &'a mut B,
}

impl<'a, E, B> Executor<'a, E, B>
where
    E: Environment + ?Sized,
    B: BuiltinHandler + ?Sized,
{
    fn run(&mut self, id: NodeId, context: Context) -> Result<ExitStatus, ExecError> {
        let ast = self.ast;
        match ast.node(id) {
            Node::Command { name, args } => self.command(*name, args, context),
            Node::Redirection {
                direction,
                target,
                child,
            } => self.redirection(*direction, target, *child, context),
            Node::Pipe { left, right } => self.pipe(*left, *right),
            Node::StringLiteral(value) => Err(ExecError::NotExecutable(value.clone())),
            Node::EnvReference(name) => Err(ExecError::NotExecutable(format!("${}", name))),
        }
    }

    fn word(&self, id: NodeId) -> String {
        match self.ast.node(id) {
            Node::StringLiteral(value) => value.clone(),
            Node::EnvReference(name) => self.env.var(name).unwrap_or_default(),
            other => {
                warn!("ignoring non-word argument {:?}", other);
                String::new()
            }
        }
    }

    fn command(
        &mut self,
        name: NodeId,
        args: &[NodeId],
        context: Context,
    ) -> Result<ExitStatus, ExecError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.word(name));
        argv.extend(args.iter().map(|arg| self.word(*arg)));
        if argv[0].is_empty() {
            return Err(ExecError::EmptyCommandName);
        }

        if self.builtins.is_builtin(&argv[0]) {
            debug!("running builtin {:?}", argv);
            return Ok(self.builtins.run_builtin(&argv));
        }

        let search_path = self.env.var("PATH");
        let path = find_executable(&argv[0], search_path.as_deref())?;
        let program = Program::new(&path, &argv)?;
        match context {
            Context::Subprocess => Err(program.exec()),
            Context::Shell => {
                let pid = fork_child(|| {
                    let error = program.exec();
                    eprintln!("eggshell: {}", error);
                    error.exit_code()
                })?;
                debug!("spawned {} for {:?}", pid, argv);
                wait_for(pid)
            }
        }
    }

    fn redirection(
        &mut self,
        direction: Direction,
        target: &str,
        child: NodeId,
        context: Context,
    ) -> Result<ExitStatus, ExecError> {
        let _redirect = Redirect::apply(direction, target)?;
        self.run(child, context)
    }

    /// Flattens the right-leaning chain `a | (b | c)` into `[a, b, c]`.
    fn stages(&self, left: NodeId, right: NodeId) -> Vec<NodeId> {
        let mut stages = vec![left];
        let mut rest = right;
        while let Node::Pipe { left, right } = self.ast.node(rest) {
            stages.push(*left);
            rest = *right;
        }
        stages.push(rest);
        stages
    }

    /// Every stage of the chain is a direct child of this process. The
    /// status is the last stage's.
    fn pipe(&mut self, left: NodeId, right: NodeId) -> Result<ExitStatus, ExecError> {
        let stages = self.stages(left, right);
        let last = stages.len() - 1;
        let mut children = Vec::with_capacity(stages.len());
        let mut input: Option<OwnedFd> = None;

        for (index, stage) in stages.iter().copied().enumerate() {
            let (next_input, output) = if index < last {
                match unistd::pipe() {
                    Ok((read_end, write_end)) => (Some(read_end), Some(write_end)),
                    Err(e) => {
                        drop(input);
                        reap(&children);
                        return Err(ExecError::Pipe(e));
                    }
                }
            } else {
                (None, None)
            };
            let stdin = input.as_ref().map(AsRawFd::as_raw_fd);
            let stdout = output.as_ref().map(AsRawFd::as_raw_fd);
            let unused = next_input.as_ref().map(AsRawFd::as_raw_fd);

            let spawned = fork_child(|| self.pipe_side(stage, stdin, stdout, unused));
            // Holding a write end open here would keep the reader from ever
            // seeing end of stream.
            drop(input);
            drop(output);
            match spawned {
                Ok(pid) => children.push(pid),
                Err(error) => {
                    drop(next_input);
                    reap(&children);
                    return Err(error);
                }
            }
            input = next_input;
        }

        let (last_child, others) = match children.split_last() {
            Some(split) => split,
            None => return Ok(ExitStatus::SUCCESS),
        };
        for pid in others {
            match wait_for(*pid) {
                Ok(status) => debug!("pipeline stage {} finished with {}", pid, status),
                Err(e) => warn!("pipeline stage {}: {}", pid, e),
            }
        }
        wait_for(*last_child)
    }

    /// Body of one forked pipeline stage: `stdin` and `stdout` are pipe
    /// ends to rebind onto 0 and 1, `unused` is the read end meant for the
    /// next stage. All of them are closed before the sub-tree runs.
    fn pipe_side(
        &mut self,
        id: NodeId,
        stdin: Option<RawFd>,
        stdout: Option<RawFd>,
        unused: Option<RawFd>,
    ) -> i32 {
        let rebinds = [(stdin, libc::STDIN_FILENO), (stdout, libc::STDOUT_FILENO)];
        for (fd, target) in rebinds.iter().copied() {
            if let Some(fd) = fd {
                if let Err(e) = dup2(fd, target) {
                    eprintln!("eggshell: {}", ExecError::Descriptor(e));
                    return 1;
                }
                let _ = close(fd);
            }
        }
        if let Some(fd) = unused {
            let _ = close(fd);
        }
        match self.run(id, Context::Subprocess) {
            Ok(status) => status.code(),
            Err(error) => {
                eprintln!("eggshell: {}", error);
                error.exit_code()
            }
        }
    }
}

/// Wait for stages that were already started before bailing out.
fn reap(children: &[Pid]) {
    for pid in children {
        if let Err(e) = wait_for(*pid) {
            warn!("pipeline stage {}: {}", pid, e);
        }
    }
}

/// Execute the whole tree.
pub fn execute<E, B>(ast: &Ast, env: &E, builtins: &mut B) -> Result<ExitStatus, ExecError>
where
    E: Environment + ?Sized,
    B: BuiltinHandler + ?Sized,
{
    execute_node(ast, ast.root(), env, builtins)
}

/// Execute the sub-tree rooted at `id`.
pub fn execute_node<E, B>(
    ast: &Ast,
    id: NodeId,
    env: &E,
    builtins: &mut B,
) -> Result<ExitStatus, ExecError>
where
    E: Environment + ?Sized,
    B: BuiltinHandler + ?Sized,
{
    let mut executor = Executor { ast, env, builtins };
    executor.run(id, Context::Shell)
}

/// Builtin table with nothing in it, for running trees outside a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuiltins;

impl BuiltinHandler for NoBuiltins {
    fn is_builtin(&self, _name: &str) -> bool {
        false
    }

    fn run_builtin(&mut self, _argv: &[String]) -> ExitStatus {
        ExitStatus::FAILURE
    }
}
