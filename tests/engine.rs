//! Executes parsed trees inside the test process. Every test here touches
//! the process-wide descriptor table or working directory, so they run one
//! at a time.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use eggshell::shell::exec::{execute, ExecError, ExitStatus, NoBuiltins, ProcessEnvironment};
use eggshell::shell::state::ShellState;
use eggshell::shell::syntax::{parse, Arena, Ast, Node};
use eggshell::Config;
use nix::sys::stat::fstat;
use pretty_assertions::assert_eq;
use serial_test::serial;

fn run(line: &str) -> Result<ExitStatus, ExecError> {
    let ast = parse(line).expect("line should parse");
    execute(&ast, &ProcessEnvironment, &mut NoBuiltins)
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn identity(fd: i32) -> (u64, u64) {
    let stat = fstat(fd).expect("fstat");
    (stat.st_dev as u64, stat.st_ino as u64)
}

#[test]
#[serial]
fn redirected_output_lands_in_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let before = identity(1);

    let status = run(&format!("echo hello world > {}", quoted(&out))).unwrap();

    assert!(status.success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "hello world\n");
    assert_eq!(identity(1), before);
}

#[test]
#[serial]
fn output_redirection_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    fs::write(&out, "a much longer previous content\n").unwrap();
    run(&format!("echo short > {}", quoted(&out))).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "short\n");
}

#[test]
#[serial]
fn input_redirection_feeds_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let out = dir.path().join("out.txt");
    fs::write(&input, "shout\n").unwrap();
    let before = identity(0);

    let line = format!("tr a-z A-Z < {} > {}", quoted(&input), quoted(&out));
    assert!(run(&line).unwrap().success());

    assert_eq!(fs::read_to_string(&out).unwrap(), "SHOUT\n");
    assert_eq!(identity(0), before);
}

#[test]
#[serial]
fn missing_input_file_is_reported_without_running_anything() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let before = identity(0);

    match run(&format!("cat < {}", quoted(&missing))) {
        Err(ExecError::RedirectionOpenFailed { path, .. }) => {
            assert_eq!(path, missing.display().to_string());
        }
        other => panic!("expected an open failure, got {:?}", other),
    }
    assert_eq!(identity(0), before);
}

#[test]
#[serial]
fn unwritable_output_target_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("no-such-dir").join("out.txt");
    let before = identity(1);
    assert!(matches!(
        run(&format!("echo hi > {}", quoted(&target))),
        Err(ExecError::RedirectionOpenFailed { .. })
    ));
    assert_eq!(identity(1), before);
}

#[test]
#[serial]
fn two_stage_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let status = run(&format!("echo hello | tr a-z A-Z > {}", quoted(&out))).unwrap();
    assert!(status.success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "HELLO\n");
}

#[test]
#[serial]
fn three_stage_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let line = format!("echo abc | tr a-z A-Z | tr -d B > {}", quoted(&out));
    assert!(run(&line).unwrap().success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "AC\n");
}

#[test]
#[serial]
fn every_pipeline_stage_is_a_child_of_the_shell() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("parents.txt");
    let stage = format!("sh -c \"echo $PPID >> '{}'\"", out.display());
    let line = format!("{} | {} | {}", stage, stage, stage);

    assert!(run(&line).unwrap().success());

    let shell = std::process::id().to_string();
    let parents = fs::read_to_string(&out).unwrap();
    assert_eq!(parents.lines().collect::<Vec<_>>(), vec![shell.as_str(); 3]);
}

#[test]
#[serial]
fn pipeline_reports_the_right_hand_status() {
    assert_eq!(run("true | false").unwrap(), ExitStatus::new(1));
    assert_eq!(run("false | true").unwrap(), ExitStatus::SUCCESS);
    assert_eq!(run("true | true | false").unwrap(), ExitStatus::new(1));
}

#[test]
#[serial]
fn command_status_propagates() {
    assert_eq!(run("true").unwrap(), ExitStatus::SUCCESS);
    assert_eq!(run("false").unwrap(), ExitStatus::new(1));
}

#[test]
#[serial]
fn unknown_command_is_recoverable() {
    match run("eggshell-no-such-command --flag") {
        Err(error @ ExecError::CommandNotFound(_)) => assert_eq!(error.exit_code(), 127),
        other => panic!("expected command not found, got {:?}", other),
    }
    // The engine is still usable afterwards.
    assert!(run("true").unwrap().success());
}

#[test]
#[serial]
fn unknown_command_inside_a_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let line = format!("eggshell-no-such-command | tr a b > {}", quoted(&out));
    assert_eq!(run(&line).unwrap(), ExitStatus::SUCCESS);
    assert_eq!(fs::read_to_string(&out).unwrap(), "");
    assert_eq!(
        run("true | eggshell-no-such-command").unwrap(),
        ExitStatus::new(127)
    );
}

#[test]
#[serial]
fn environment_references_resolve_at_execution() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut vars = HashMap::new();
    vars.insert("PATH".to_owned(), env::var("PATH").unwrap_or_default());
    vars.insert("GREETING".to_owned(), "hi".to_owned());

    let ast = parse(&format!("echo $GREETING $UNSET there > {}", quoted(&out))).unwrap();
    assert!(execute(&ast, &vars, &mut NoBuiltins).unwrap().success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi  there\n");

    vars.insert("GREETING".to_owned(), "bye".to_owned());
    assert!(execute(&ast, &vars, &mut NoBuiltins).unwrap().success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "bye  there\n");
}

#[test]
#[serial]
fn command_name_from_the_environment() {
    let mut vars = HashMap::new();
    vars.insert("PATH".to_owned(), env::var("PATH").unwrap_or_default());
    vars.insert("TOOL".to_owned(), "true".to_owned());
    let ast = parse("$TOOL").unwrap();
    assert!(execute(&ast, &vars, &mut NoBuiltins).unwrap().success());

    let ast = parse("$NOTHING arg").unwrap();
    assert!(matches!(
        execute(&ast, &vars, &mut NoBuiltins),
        Err(ExecError::EmptyCommandName)
    ));
}

#[test]
#[serial]
fn empty_search_path_finds_nothing() {
    let vars: HashMap<String, String> = HashMap::new();
    let ast = parse("true").unwrap();
    assert!(matches!(
        execute(&ast, &vars, &mut NoBuiltins),
        Err(ExecError::CommandNotFound(_))
    ));
}

#[test]
#[serial]
fn literal_root_is_not_executable() {
    let mut arena = Arena::new();
    let root = arena.alloc(Node::StringLiteral("hello".to_owned()));
    let ast = Ast::new(arena, root);
    assert!(matches!(
        execute(&ast, &ProcessEnvironment, &mut NoBuiltins),
        Err(ExecError::NotExecutable(_))
    ));

    let mut arena = Arena::new();
    let root = arena.alloc(Node::EnvReference("HOME".to_owned()));
    let ast = Ast::new(arena, root);
    assert!(matches!(
        execute(&ast, &ProcessEnvironment, &mut NoBuiltins),
        Err(ExecError::NotExecutable(_))
    ));
}

#[test]
#[serial]
fn cd_runs_in_the_shell_process() {
    let original = env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut state = ShellState::new(&Config::default());

    let ast = parse(&format!("cd {}", quoted(dir.path()))).unwrap();
    let status = execute(&ast, &ProcessEnvironment, &mut state).unwrap();
    let now = env::current_dir().unwrap();
    env::set_current_dir(&original).unwrap();

    assert!(status.success());
    assert_eq!(
        now.canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
#[serial]
fn cd_to_a_missing_directory_fails() {
    let original = env::current_dir().unwrap();
    let mut state = ShellState::new(&Config::default());
    let ast = parse("cd /eggshell/definitely/not/here").unwrap();
    assert_eq!(
        execute(&ast, &ProcessEnvironment, &mut state).unwrap(),
        ExitStatus::FAILURE
    );
    assert_eq!(env::current_dir().unwrap(), original);
}

#[test]
#[serial]
fn builtin_inside_a_pipeline_does_not_touch_the_shell() {
    let original = env::current_dir().unwrap();
    let mut state = ShellState::new(&Config::default());
    let ast = parse("cd / | true").unwrap();
    assert!(execute(&ast, &ProcessEnvironment, &mut state).unwrap().success());
    assert_eq!(env::current_dir().unwrap(), original);

    let ast = parse("exit 4 | true").unwrap();
    execute(&ast, &ProcessEnvironment, &mut state).unwrap();
    assert_eq!(state.exit_requested(), None);
}
