use std::{io, path::PathBuf};

use thiserror::Error;

//Malformed operator/operand arrangements. Always detected before anything is spawned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("too many redirection/pipe operators")]
    TooManyOperators,
    #[error("more than one input redirection")]
    DuplicateInput,
    #[error("more than one output redirection")]
    DuplicateOutput,
    #[error("input redirection must follow the first command")]
    MisplacedInput,
    #[error("output redirection must follow the last command")]
    MisplacedOutput,
    #[error("'{operator}' expects exactly one file name, got '{found}'")]
    BadRedirectTarget { operator: char, found: String },
    #[error("builtin '{0}' cannot be combined with pipes or redirections")]
    BuiltinInPipeline(String),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    //Builtin precondition failures (e.g. cd into a missing directory)
    #[error("{command}: {message}")]
    Environment {
        command: &'static str,
        message: String,
    },

    #[error(
        "stage {} '{}': cannot open '{}': {}",
        .stage_index,
        .command_name,
        .path.display(),
        .cause
    )]
    RedirectOpen {
        stage_index: usize,
        command_name: String,
        path: PathBuf,
        #[source]
        cause: io::Error,
    },

    #[error("stage {stage_index} '{command_name}': {cause}")]
    Spawn {
        stage_index: usize,
        command_name: String,
        #[source]
        cause: io::Error,
    },

    #[error("cannot allocate pipe: {0}")]
    PipeAllocation(#[source] io::Error),

    #[error("failed to reap '{command_name}': {cause}")]
    Reap {
        command_name: String,
        #[source]
        cause: io::Error,
    },
}

impl ShellError {
    pub fn environment(command: &'static str, message: impl Into<String>) -> Self {
        ShellError::Environment {
            command,
            message: message.into(),
        }
    }
}
