use std::path::PathBuf;

use tracing::debug;

use crate::{
    error::SyntaxError,
    instruction::{Command, Pipeline, Redirect},
};

pub const PIPE: char = '|';
pub const REDIRECT_IN: char = '<';
pub const REDIRECT_OUT: char = '>';

/*
Result of splitting a raw line on the operator characters.
There is always exactly one more segment than operators: segment i sits
between operators i-1 and i. Segments keep their surrounding whitespace.
*/
#[derive(Debug, PartialEq, Eq)]
pub struct Tokens<'a> {
    pub segments: Vec<&'a str>,
    pub operators: Vec<char>,
}

impl<'a> Tokens<'a> {
    pub fn is_blank(&self) -> bool {
        self.operators.is_empty() && self.segments.iter().all(|s| s.trim().is_empty())
    }

    //Segments holding at least one word
    pub fn stage_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.trim().is_empty()).count()
    }
}

fn is_operator(c: char) -> bool {
    c == PIPE || c == REDIRECT_IN || c == REDIRECT_OUT
}

/*
Splits the input on '|', '<' and '>'. No quoting or escaping exists, so an
operator character can never be part of an argument.
*/
pub fn tokenize(input: &str) -> Tokens<'_> {
    let mut segments = Vec::new();
    let mut operators = Vec::new();
    let mut start = 0;
    for (i, c) in input.char_indices() {
        if is_operator(c) {
            segments.push(&input[start..i]);
            operators.push(c);
            start = i + c.len_utf8();
        }
    }
    segments.push(&input[start..]);
    Tokens {
        segments,
        operators,
    }
}

fn split_words(segment: &str) -> Vec<String> {
    segment.split_whitespace().map(str::to_string).collect()
}

//A redirect target segment must consist of exactly one word
fn redirect_target(operator: char, segment: &str) -> Result<PathBuf, SyntaxError> {
    let mut words = segment.split_whitespace();
    match (words.next(), words.next()) {
        (Some(path), None) => Ok(PathBuf::from(path)),
        _ => Err(SyntaxError::BadRedirectTarget {
            operator,
            found: segment.trim().to_string(),
        }),
    }
}

/*
Builds a Pipeline from tokenized input.
'<' may only be the first operator and binds the segment right after it as the
input file; '>' may only be the last operator and binds the segment after it as
the output file. Every other operator is a pipe between two commands.
Returns Ok(None) for a blank line.
*/
pub fn build_pipeline(tokens: &Tokens) -> Result<Option<Pipeline>, SyntaxError> {
    if tokens.is_blank() {
        return Ok(None);
    }

    let operators = &tokens.operators;
    if !operators.is_empty() && operators.len() >= tokens.stage_count() {
        return Err(SyntaxError::TooManyOperators);
    }
    if operators.iter().filter(|&&op| op == REDIRECT_IN).count() > 1 {
        return Err(SyntaxError::DuplicateInput);
    }
    if operators.iter().filter(|&&op| op == REDIRECT_OUT).count() > 1 {
        return Err(SyntaxError::DuplicateOutput);
    }

    let last = operators.len().saturating_sub(1);
    let mut input = Redirect::None;
    let mut output = Redirect::None;
    //Indices of segments consumed as file names
    let mut file_segments = Vec::new();
    for (i, &op) in operators.iter().enumerate() {
        match op {
            REDIRECT_IN => {
                if i != 0 {
                    return Err(SyntaxError::MisplacedInput);
                }
                input = Redirect::InputFile(redirect_target(op, tokens.segments[i + 1])?);
                file_segments.push(i + 1);
            }
            REDIRECT_OUT => {
                if i != last {
                    return Err(SyntaxError::MisplacedOutput);
                }
                output = Redirect::OutputFile(redirect_target(op, tokens.segments[i + 1])?);
                file_segments.push(i + 1);
            }
            _ => {}
        }
    }

    let commands: Vec<Command> = tokens
        .segments
        .iter()
        .enumerate()
        .filter(|(i, _)| !file_segments.contains(i))
        .filter_map(|(_, segment)| Command::new(split_words(segment)))
        .collect();

    //Every segment holds a word at this point, so each pipe sits between two commands
    debug_assert_eq!(
        operators.iter().filter(|&&op| op == PIPE).count() + 1,
        commands.len()
    );

    let pipeline = Pipeline::new(commands, input, output).ok_or(SyntaxError::TooManyOperators)?;
    debug!(
        stages = pipeline.commands().len(),
        input = ?pipeline.input(),
        output = ?pipeline.output(),
        "built pipeline"
    );
    Ok(Some(pipeline))
}

/*
Parses the user's input into a Pipeline.
Ok(None) means the line was blank and nothing should happen.
*/
pub fn parse_input(input: &str) -> Result<Option<Pipeline>, SyntaxError> {
    build_pipeline(&tokenize(input))
}
