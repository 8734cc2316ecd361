pub mod shell;

pub use shell::config::Config;
pub use shell::exec::{execute, BuiltinHandler, Environment, ExecError, ExitStatus};
pub use shell::syntax::{parse, Ast, Node, ParseError};
pub use shell::{Shell, ShellError};
