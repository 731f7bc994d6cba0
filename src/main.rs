use std::io;

use crossterm::tty::IsTty;
use tracing_subscriber::EnvFilter;

use pipesh::{
    config::{Config, DEFAULT_LOG_FILTER, LOG_VAR},
    user::{Input, Output},
    Session, Status,
};

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();

    let mut stdout = io::stdout();
    let stdin = io::stdin();
    let interactive = stdin.is_tty();
    let mut session = Session::new(Config::from_env());
    let mut input = Input::new(stdin.lock(), interactive);
    loop {
        let line = match input.prompt(&mut stdout, &session.exit_code, session.cwd()) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Output::shell_error(&e);
                continue;
            }
            Err(e) => {
                Output::shell_error(&e);
                break;
            }
        };

        match session.execute_input(&line) {
            Ok(Status::Continue) => {}
            Ok(Status::Exit) => {
                if input.is_interactive() {
                    Output::goodbye(&mut stdout);
                }
                break;
            }
            Err(e) => {
                Output::shell_error(&e);
                for other in session.take_deferred_errors() {
                    Output::shell_error(&other);
                }
            }
        }
    }
}
