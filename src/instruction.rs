use std::path::PathBuf;

//Where the outer boundary of a pipeline reads from / writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    None,                //Shell's own stdin/stdout
    InputFile(PathBuf),  //'<' path, feeds the first stage
    OutputFile(PathBuf), //'>' path, receives the last stage's stdout
}

impl Redirect {
    pub fn is_none(&self) -> bool {
        matches!(self, Redirect::None)
    }
}

//A single stage: argv[0] is the program or builtin name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    //Returns None for an empty argument vector
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

//Everything derived from one input line. Built fresh per line and
//consumed by a single execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>, //Never empty
    input: Redirect,        //None or InputFile
    output: Redirect,       //None or OutputFile
}

impl Pipeline {
    /*
    Returns None when there is no command, or when a redirect sits on the
    wrong side (an OutputFile as input or an InputFile as output).
    */
    pub fn new(commands: Vec<Command>, input: Redirect, output: Redirect) -> Option<Self> {
        if commands.is_empty()
            || matches!(input, Redirect::OutputFile(_))
            || matches!(output, Redirect::InputFile(_))
        {
            return None;
        }
        Some(Self {
            commands,
            input,
            output,
        })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn input(&self) -> &Redirect {
        &self.input
    }

    pub fn output(&self) -> &Redirect {
        &self.output
    }

    pub fn last_index(&self) -> usize {
        self.commands.len() - 1
    }

    pub fn is_single(&self) -> bool {
        self.commands.len() == 1
    }

    pub fn is_redirected(&self) -> bool {
        !self.input.is_none() || !self.output.is_none()
    }

    pub fn pipe_count(&self) -> usize {
        self.last_index()
    }
}
