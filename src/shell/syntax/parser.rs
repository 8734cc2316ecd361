use log::{debug, trace};
use thiserror::Error;

use super::ast::*;
use super::lexer::{LexError, Lexer};
use super::tokens::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,
    #[error("expected a command")]
    ExpectedCommand,
    #[error("expected a command after `|`")]
    ExpectedCommandAfterPipe,
    #[error("expected a file name after redirection")]
    ExpectedRedirectionTarget,
    #[error("command name is empty")]
    EmptyCommandName,
    #[error(transparent)]
    Lex(#[from] LexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    LineStart,
    AfterPipe,
}

impl Position {
    fn missing_command(self, at_end: bool) -> ParseError {
        match (self, at_end) {
            (Position::LineStart, true) => ParseError::EmptyInput,
            (Position::LineStart, false) => ParseError::ExpectedCommand,
            (Position::AfterPipe, _) => ParseError::ExpectedCommandAfterPipe,
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    arena: Arena,
}

impl<'a> Parser<'a> {
    fn new(line: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(line),
            peeked: None,
            arena: Arena::new(),
        }
    }

    fn next(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        }
    }

    // Grouping and backgrounding are lexed but have no meaning yet.
    fn next_significant(&mut self) -> Token {
        loop {
            let token = self.next();
            if token.is_reserved() {
                trace!("ignoring reserved token {:?}", token);
                continue;
            }
            return token;
        }
    }

    fn push_back(&mut self, token: Token) {
        self.peeked = Some(token);
    }

    /// pipeline := segment ( PIPE pipeline )?
    fn pipeline(&mut self, position: Position) -> Result<NodeId, ParseError> {
        let left = self.segment(position)?;
        match self.next() {
            Token::Pipe => {
                let right = self.pipeline(Position::AfterPipe)?;
                Ok(self.arena.alloc(Node::Pipe { left, right }))
            }
            token => {
                self.push_back(token);
                Ok(left)
            }
        }
    }

    /// segment := word ( word | REDIRECT Word )*
    ///
    /// Stops in front of a pipe or the end of input without consuming it.
    fn segment(&mut self, position: Position) -> Result<NodeId, ParseError> {
        let name = match self.next_significant() {
            Token::Word(word) => {
                if word.is_empty() {
                    return Err(ParseError::EmptyCommandName);
                }
                self.arena.alloc(Node::StringLiteral(word))
            }
            Token::EnvRef(var) => self.arena.alloc(Node::EnvReference(var)),
            Token::Error(error) => return Err(error.into()),
            Token::EndOfInput => return Err(position.missing_command(true)),
            _ => return Err(position.missing_command(false)),
        };
        let command = self.arena.alloc(Node::Command {
            name,
            args: Vec::new(),
        });
        let mut head = command;
        loop {
            match self.next_significant() {
                Token::Word(word) => {
                    let arg = self.arena.alloc(Node::StringLiteral(word));
                    self.push_argument(command, arg);
                }
                Token::EnvRef(var) => {
                    let arg = self.arena.alloc(Node::EnvReference(var));
                    self.push_argument(command, arg);
                }
                Token::Redirect(direction) => {
                    let target = match self.next() {
                        Token::Word(target) => target,
                        Token::Error(error) => return Err(error.into()),
                        _ => return Err(ParseError::ExpectedRedirectionTarget),
                    };
                    head = self.arena.alloc(Node::Redirection {
                        direction,
                        target,
                        child: head,
                    });
                }
                Token::Error(error) => return Err(error.into()),
                token @ (Token::Pipe | Token::EndOfInput) => {
                    self.push_back(token);
                    return Ok(head);
                }
                Token::LParen | Token::RParen | Token::Background => {}
            }
        }
    }

    fn push_argument(&mut self, command: NodeId, arg: NodeId) {
        if let Some(Node::Command { args, .. }) = self.arena.get_mut(command) {
            args.push(arg);
        }
    }
}

/// Parse one line into a tree backed by a fresh arena.
pub fn parse(line: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(line);
    let root = parser.pipeline(Position::LineStart)?;
    debug!("parsed {:?} into {} nodes", line, parser.arena.len());
    Ok(Ast::new(parser.arena, root))
}
