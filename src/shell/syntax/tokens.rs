use std::fmt;

use super::lexer::LexError;

/// Which standard stream a redirection rebinds.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Direction::In => '<',
            Direction::Out => '>',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Token {
    LParen,
    RParen,
    Word(String),
    Pipe,
    Redirect(Direction),
    Background,
    /// Variable name, without the leading `$`.
    EnvRef(String),
    EndOfInput,
    Error(LexError),
}

impl Token {
    /// Tokens the lexer knows about but the grammar does not use yet.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Token::LParen | Token::RParen | Token::Background)
    }
}
