use std::{
    error::Error,
    io::{self, BufRead, Stdout, Write},
    path::Path,
};

use crossterm::{
    execute,
    style::{Attribute, Color, Colors, Print, SetAttribute, SetColors},
    tty::IsTty,
};

use crate::utils;

/*
Line reader handed to the shell loop. Wraps any buffered reader so the shell
can be driven by a terminal, a pipe or a test.
*/
pub struct Input<R> {
    reader: R,
    interactive: bool, //Print prompts only when a person is typing
    line: String,
}

pub struct Output;

impl<R: BufRead> Input<R> {
    pub fn new(reader: R, interactive: bool) -> Self {
        Self {
            reader,
            interactive,
            line: String::new(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    //Shows the prompt (interactive only) and reads the next line
    pub fn prompt(
        &mut self,
        stdout: &mut Stdout,
        exit_code: &str,
        cwd: &Path,
    ) -> io::Result<Option<String>> {
        if self.interactive {
            let home = utils::home_dir().ok();
            let mut prompt = utils::prompt_dir(cwd, home.as_deref());
            prompt.push_str("> ");
            let mut prompt_color = Color::White;
            if exit_code != "0" {
                prompt_color = Color::Red;
            }
            execute!(
                stdout,
                SetColors(Colors {
                    foreground: Some(prompt_color),
                    background: None
                }),
                Print(prompt),
                SetAttribute(Attribute::Reset)
            )?;
        }
        self.read_line()
    }

    /*
    Returns the next line without its line terminator, or None at end of input.
    A line that is not valid UTF-8 is consumed and reported as InvalidData.
    */
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        let trimmed = self.line.trim_end_matches(['\n', '\r']);
        Ok(Some(trimmed.to_string()))
    }
}

impl Output {
    //One line on stderr per error, coloured only on a terminal
    pub fn shell_error(err: &dyn Error) {
        let mut stderr = io::stderr();
        let result = if stderr.is_tty() {
            execute!(
                stderr,
                SetColors(Colors {
                    foreground: Some(Color::DarkRed),
                    background: None
                }),
                SetAttribute(Attribute::Bold),
                Print("pipesh:"),
                SetAttribute(Attribute::Reset),
                Print(format!(" {}\n", err))
            )
        } else {
            writeln!(stderr, "pipesh: {}", err)
        };
        if let Err(e) = result {
            tracing::error!("could not report error '{}': {}", err, e);
        }
    }

    pub fn goodbye<W: Write>(stdout: &mut W) {
        if let Err(e) = writeln!(stdout, "Goodbye.").and_then(|_| stdout.flush()) {
            tracing::error!("could not write goodbye: {}", e);
        }
    }
}
