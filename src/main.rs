use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use eggshell::{Config, Shell};

#[derive(Parser)]
#[command(name = "eggshell")]
#[command(about = "A small interactive shell with pipes and redirection")]
#[command(version)]
struct Cli {
    /// Run one line and exit with its status
    #[arg(short = 'c')]
    command: Option<String>,

    /// Number of lines kept by `history`
    #[arg(long = "history-size")]
    history_size: Option<usize>,

    /// Print the prompt without colours
    #[arg(long = "no-color")]
    no_color: bool,

    /// Leave the terminal contents alone on start
    #[arg(long = "no-clear")]
    no_clear: bool,

    /// Script file to run line by line
    #[arg()]
    script_file: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("EGGSHELL_LOG", "warn")).init();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(size) = cli.history_size {
        config.set_history_size(size);
    }
    if cli.no_color {
        config.set_color(false);
    }
    if cli.no_clear {
        config.set_clear_screen(false);
    }

    let mut shell = Shell::new(config);
    let result = if let Some(line) = cli.command {
        shell.run_line(&line);
        Ok(shell.exit_requested().unwrap_or(shell.state().last_status()))
    } else if let Some(path) = cli.script_file {
        match File::open(&path) {
            Ok(file) => shell.run_script(BufReader::new(file)),
            Err(e) => {
                eprintln!("eggshell: {}: {}", path.display(), e);
                process::exit(127);
            }
        }
    } else if io::stdin().is_terminal() {
        shell.run_interactive()
    } else {
        shell.run_script(io::stdin().lock())
    };

    match result {
        Ok(status) => process::exit(status.code()),
        Err(e) => {
            eprintln!("eggshell: {}", e);
            process::exit(1);
        }
    }
}
