//! Recursive descent parser for toolpath command text
//! Converts tokens into `Command`s. A line may hold several commands:
//! every comment and every G or M word starts a new one.

use crate::lexer::{lex, Spanned, Token};
use crate::toolpath::Command;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Range<usize>,
    },

    #[error("unrecognised input '{text}'")]
    InvalidToken { text: String, span: Range<usize> },

    #[error("invalid number")]
    InvalidNumber { span: Range<usize> },

    #[error("parameter {letter} given twice")]
    DuplicateParameter { letter: char, span: Range<usize> },
}

impl ParseError {
    /// Byte range of the offending text
    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidToken { span, .. }
            | ParseError::InvalidNumber { span }
            | ParseError::DuplicateParameter { span, .. } => span.clone(),
        }
    }
}

/// Words that name a command rather than a parameter
pub const COMMAND_LETTERS: [char; 2] = ['G', 'M'];

pub type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned>,
    position: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: lex(source),
            position: 0,
        }
    }

    /// Parse every command in the text
    pub fn parse(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();

        loop {
            self.skip_newlines();
            if self.position >= self.tokens.len() {
                break;
            }
            commands.push(self.parse_command()?);
        }

        Ok(commands)
    }

    fn parse_command(&mut self) -> Result<Command> {
        let (token, span) = self.advance_checked()?;

        let mut command = match token {
            // A comment is a command of its own and never takes parameters
            Token::Comment(text) => return Ok(Command::new(text)),
            Token::Word((_, None)) => return Err(ParseError::InvalidNumber { span }),
            Token::Word(_) => Command::new(self.source[span].to_ascii_uppercase()),
            Token::Newline => {
                return Err(ParseError::UnexpectedToken {
                    expected: "command".to_string(),
                    got: "end of line".to_string(),
                    span,
                })
            }
        };

        while let Some((next, _)) = self.tokens.get(self.position) {
            match next {
                Ok(Token::Newline) => {
                    self.position += 1;
                    break;
                }
                // A comment or a G/M word starts the next command on the same line
                Ok(Token::Comment(_)) => break,
                Ok(Token::Word((letter, _))) if COMMAND_LETTERS.contains(letter) => break,
                _ => {}
            }

            let (token, span) = self.advance_checked()?;
            if let Token::Word((letter, value)) = token {
                let value = value.ok_or(ParseError::InvalidNumber { span: span.clone() })?;
                if command.params.insert(letter, value).is_some() {
                    return Err(ParseError::DuplicateParameter { letter, span });
                }
            }
        }

        Ok(command)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens
            .get(self.position)
            .and_then(|(t, _)| t.as_ref().ok())
    }

    fn advance_checked(&mut self) -> Result<(Token, Range<usize>)> {
        let (result, span) = self.tokens[self.position].clone();
        self.position += 1;
        result.map(|token| (token, span.clone())).map_err(|_| ParseError::InvalidToken {
            text: self.source[span.clone()].to_string(),
            span,
        })
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.position += 1;
        }
    }
}

/// Parse newline-separated command text
pub fn parse_commands(source: &str) -> Result<Vec<Command>> {
    Parser::new(source).parse()
}
