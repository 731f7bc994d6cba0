use std::{
    env, fs,
    io::{self, Write},
    mem,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use nix::unistd::{self, AccessFlags};
use tracing::{debug, info, warn};

use crate::{
    builtin::{Builtin, HELP},
    config::Config,
    error::ShellError,
    instruction::{Command, Pipeline},
    text_processing,
};

mod reap;
mod spawn;

use spawn::Orchestrator;

//Whether the line loop keeps reading after a line was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continue,
    Exit,
}

pub struct Session {
    cwd: PathBuf,          //Working directory handed to every spawned stage
    pub exit_code: String, //Status of the last pipeline's final stage, for the prompt
    config: Config,
    deferred: Vec<ShellError>, //Errors after the first one of the last pipeline
}

impl Session {
    pub fn new(config: Config) -> Self {
        let cwd = env::current_dir().unwrap_or(PathBuf::from("."));
        Self::with_cwd(config, cwd)
    }

    //Starts in an explicit directory without touching the process's own cwd
    pub fn with_cwd(config: Config, cwd: impl Into<PathBuf>) -> Self {
        Session {
            cwd: cwd.into(),
            exit_code: String::from("0"),
            config,
            deferred: Vec::new(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /*
    A pipeline can fail in more than one way (a stage that did not start and a
    stage that could not be reaped). execute_input returns the first error;
    the others are kept here until the caller reports them.
    */
    pub fn take_deferred_errors(&mut self) -> Vec<ShellError> {
        mem::take(&mut self.deferred)
    }

    /*
    Parses and runs one line of input.
    Blank lines do nothing. Syntax errors are returned before any process is
    started. Every error leaves the session usable for the next line.
    */
    pub fn execute_input(&mut self, input: &str) -> Result<Status, ShellError> {
        match text_processing::parse_input(input)? {
            Some(pipeline) => self.execute_pipeline(&pipeline),
            None => Ok(Status::Continue),
        }
    }

    pub fn execute_pipeline(&mut self, pipeline: &Pipeline) -> Result<Status, ShellError> {
        self.deferred.clear();
        if let Some((builtin, command)) = Builtin::resolve(pipeline)? {
            return self.run_builtin(builtin, command);
        }

        let orchestrator = Orchestrator::new(&self.cwd, self.config.redirect_mode);
        let spawned = orchestrator.spawn_all(pipeline);
        let reaped = reap::reap_all(spawned.stages);

        self.exit_code = match (&spawned.error, reaped.status_of(pipeline.last_index())) {
            (None, Some(status)) => status_string(status),
            _ => "?".to_string(),
        };

        self.settle(spawned.error.into_iter().chain(reaped.errors))
    }

    fn settle<I>(&mut self, errors: I) -> Result<Status, ShellError>
    where
        I: IntoIterator<Item = ShellError>,
    {
        let mut errors = errors.into_iter();
        match errors.next() {
            Some(first) => {
                self.deferred.extend(errors);
                Err(first)
            }
            None => Ok(Status::Continue),
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, command: &Command) -> Result<Status, ShellError> {
        let result = match builtin {
            Builtin::Exit => {
                if !command.args().is_empty() {
                    debug!(args = ?command.args(), "ignoring arguments to {}", command.name());
                }
                return Ok(Status::Exit);
            }
            Builtin::Cd => self.change_dir(command.args()),
            Builtin::Help => {
                let mut stdout = io::stdout();
                if let Err(e) = stdout.write_all(HELP.as_bytes()).and_then(|_| stdout.flush()) {
                    warn!("could not write help text: {}", e);
                }
                Ok(())
            }
        };
        self.exit_code = String::from(if result.is_ok() { "0" } else { "1" });
        result.map(|_| Status::Continue)
    }

    /*
    cd takes exactly one directory, relative to the session's cwd.
    The target must exist, be a directory and grant search permission, the
    same checks chdir(2) makes; on any failure the cwd stays as it was.
    */
    fn change_dir(&mut self, args: &[String]) -> Result<(), ShellError> {
        let target = match args {
            [target] => target,
            [] => return Err(ShellError::environment("cd", "missing directory argument")),
            _ => return Err(ShellError::environment("cd", "too many arguments")),
        };

        let fail = |reason: String| ShellError::environment("cd", format!("{}: {}", target, reason));
        let resolved = fs::canonicalize(self.cwd.join(target)).map_err(|e| fail(e.to_string()))?;
        if !resolved.is_dir() {
            return Err(fail("Not a directory".to_string()));
        }
        unistd::access(resolved.as_path(), AccessFlags::X_OK)
            .map_err(|errno| fail(errno.desc().to_string()))?;

        info!(from = %self.cwd.display(), to = %resolved.display(), "changed directory");
        self.cwd = resolved;
        Ok(())
    }
}

fn status_string(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => code.to_string(),
        //No exit code (process was terminated by a signal)
        None => "!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(dir: &Path) -> Session {
        Session::with_cwd(Config::default(), dir)
    }

    #[test]
    fn blank_line_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        assert_eq!(session.execute_input("   \t").unwrap(), Status::Continue);
        assert_eq!(session.exit_code, "0");
    }

    #[test]
    fn exit_builtins_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        for line in ["exit", "logout", "  quit  ", "exit extra"] {
            assert_eq!(session.execute_input(line).unwrap(), Status::Exit, "{}", line);
        }
    }

    #[test]
    fn cd_requires_exactly_one_argument() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let err = session.execute_input("cd").unwrap_err();
        assert!(matches!(err, ShellError::Environment { command: "cd", .. }));
        let err = session.execute_input("cd a b").unwrap_err();
        assert!(matches!(err, ShellError::Environment { command: "cd", .. }));
        assert_eq!(session.cwd(), dir.path());
        assert_eq!(session.exit_code, "1");
    }

    #[test]
    fn cd_into_missing_directory_keeps_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let err = session.execute_input("cd /nonexistent/pipesh-test").unwrap_err();
        assert!(matches!(err, ShellError::Environment { .. }));
        assert_eq!(session.cwd(), dir.path());
    }

    #[test]
    fn cd_into_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain"), b"x").unwrap();
        let mut session = session_in(dir.path());
        let err = session.execute_input("cd plain").unwrap_err();
        assert!(err.to_string().contains("Not a directory"), "{}", err);
        assert_eq!(session.cwd(), dir.path());
    }

    #[test]
    fn cd_relative_then_parent() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        let mut session = session_in(&root);
        session.execute_input("cd sub").unwrap();
        assert_eq!(session.cwd(), root.join("sub"));
        session.execute_input("cd ..").unwrap();
        assert_eq!(session.cwd(), root);
    }

    #[test]
    fn cd_needs_search_permission() {
        use std::os::unix::fs::PermissionsExt;
        //Permission bits do not stop root
        if unistd::Uid::effective().is_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        for (name, mode) in [("readonly", 0o444), ("searchonly", 0o111)] {
            fs::create_dir(root.join(name)).unwrap();
            fs::set_permissions(root.join(name), fs::Permissions::from_mode(mode)).unwrap();
        }
        let mut session = session_in(&root);

        let readonly = session.execute_input("cd readonly");
        let cwd_after_readonly = session.cwd().to_path_buf();
        let searchonly = session.execute_input("cd searchonly").map_err(|e| e.to_string());
        let spawn_inside = session.execute_input("true").map_err(|e| e.to_string());
        let cwd_after_searchonly = session.cwd().to_path_buf();

        for name in ["readonly", "searchonly"] {
            fs::set_permissions(root.join(name), fs::Permissions::from_mode(0o755)).unwrap();
        }

        assert!(
            matches!(readonly, Err(ShellError::Environment { command: "cd", .. })),
            "{:?}",
            readonly
        );
        assert_eq!(cwd_after_readonly, root);
        assert_eq!(searchonly, Ok(Status::Continue));
        assert_eq!(spawn_inside, Ok(Status::Continue));
        assert_eq!(cwd_after_searchonly, root.join("searchonly"));
    }

    #[test]
    fn later_errors_are_kept_for_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let spawn = ShellError::Spawn {
            stage_index: 1,
            command_name: "wc".to_string(),
            cause: io::Error::from(io::ErrorKind::NotFound),
        };
        let reap = ShellError::Reap {
            command_name: "cat".to_string(),
            cause: io::Error::from(io::ErrorKind::Other),
        };

        let first = session.settle(vec![spawn, reap]).unwrap_err();
        assert!(matches!(first, ShellError::Spawn { stage_index: 1, .. }));
        let rest = session.take_deferred_errors();
        assert_eq!(rest.len(), 1);
        assert!(matches!(&rest[0], ShellError::Reap { command_name, .. } if command_name == "cat"));
        assert!(session.take_deferred_errors().is_empty());

        assert_eq!(session.settle(Vec::new()).unwrap(), Status::Continue);
    }

    #[test]
    fn deferred_errors_reset_per_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.deferred.push(ShellError::environment("cd", "stale"));
        session.execute_input("true").unwrap();
        assert!(session.take_deferred_errors().is_empty());
    }

    #[test]
    fn status_strings() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status_string(ExitStatus::from_raw(0)), "0");
        assert_eq!(status_string(ExitStatus::from_raw(3 << 8)), "3");
        assert_eq!(status_string(ExitStatus::from_raw(9)), "!");
    }
}
