use crate::{
    error::SyntaxError,
    instruction::{Command, Pipeline},
};

pub const HELP: &str = "\
pipesh: run external commands connected by pipes and redirections

  cmd [args...]                 run a program found on PATH
  cmd1 | cmd2 | ...             connect stdout of each stage to stdin of the next
  cmd < file ...                feed the first stage from file
  ... | cmd > file              write the last stage's stdout to file (created/truncated)

builtins (cannot be piped or redirected):
  cd <dir>                      change the working directory
  help                          show this text
  exit, logout, quit            leave the shell
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Cd,
    Help,
}

impl Builtin {
    //Case sensitive match on argv[0]
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "exit" | "logout" | "quit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "help" => Some(Builtin::Help),
            _ => None,
        }
    }

    /*
    Decides whether a pipeline is handled by the shell itself.
    Only a lone, unredirected command can be a builtin; a builtin name anywhere
    in a longer or redirected pipeline is rejected before anything is spawned.
    */
    pub fn resolve(pipeline: &Pipeline) -> Result<Option<(Builtin, &Command)>, SyntaxError> {
        let lone = pipeline.is_single() && !pipeline.is_redirected();
        for command in pipeline.commands() {
            if let Some(builtin) = Builtin::lookup(command.name()) {
                if !lone {
                    return Err(SyntaxError::BuiltinInPipeline(command.name().to_string()));
                }
                return Ok(Some((builtin, command)));
            }
        }
        Ok(None)
    }
}
