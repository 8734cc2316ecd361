use nom::branch::alt;
use nom::bytes::complete::{take_till, take_till1, take_while1};
use nom::character::complete::char;
use nom::combinator::{cut, map, value};
use nom::sequence::{preceded, terminated};
use nom::IResult;
use thiserror::Error;

use super::tokens::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_operator(c: char) -> bool {
    matches!(c, '(' | ')' | '|' | '&' | '>' | '<')
}

fn operator(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Pipe, char('|')),
        value(Token::Background, char('&')),
        value(Token::Redirect(Direction::Out), char('>')),
        value(Token::Redirect(Direction::In), char('<')),
    ))(input)
}

// `$` with no letter after it is left to `bare_word`.
fn env_reference(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('$'), take_while1(|c: char| c.is_ascii_alphabetic())),
        |name: &str| Token::EnvRef(name.to_owned()),
    )(input)
}

// Once the opening quote is seen a missing close quote is a hard failure,
// so `alt` does not fall back to reading the quote as a bare word.
fn quoted_word(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('"'), cut(terminated(take_till(|c: char| c == '"'), char('"')))),
        |s: &str| Token::Word(s.to_owned()),
    )(input)
}

fn bare_word(input: &str) -> IResult<&str, Token> {
    map(
        take_till1(|c: char| is_blank(c) || is_operator(c)),
        |s: &str| Token::Word(s.to_owned()),
    )(input)
}

fn lex_one(input: &str) -> IResult<&str, Token> {
    alt((operator, env_reference, quoted_word, bare_word))(input)
}

/// Lex a single token from the front of `input`, returning it along with
/// the input that remains.
///
/// At end of input this returns `Token::EndOfInput` and hands back an empty
/// slice; feeding that slice back in yields `EndOfInput` again without moving.
/// A lexical error consumes the rest of the line.
pub fn next_token(input: &str) -> (Token, &str) {
    let input = input.trim_start_matches(is_blank);
    if input.is_empty() {
        return (Token::EndOfInput, input);
    }
    match lex_one(input) {
        Ok((remaining, token)) => (token, remaining),
        Err(nom::Err::Failure(_)) => (
            Token::Error(LexError::UnterminatedString),
            &input[input.len()..],
        ),
        Err(_) => {
            let c = input.chars().next().unwrap_or('\0');
            (
                Token::Error(LexError::UnexpectedCharacter(c)),
                &input[input.len()..],
            )
        }
    }
}

/// Cursor over one line of input.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Lexer<'a> {
        Lexer { rest: line }
    }

    pub fn next_token(&mut self) -> Token {
        let (token, rest) = next_token(self.rest);
        self.rest = rest;
        token
    }

    pub fn remaining(&self) -> &'a str {
        self.rest
    }
}

/// Yields every token up to, but not including, `EndOfInput`. An error
/// token is yielded once and ends the stream.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match Lexer::next_token(self) {
            Token::EndOfInput => None,
            token => Some(token),
        }
    }
}

pub fn lex(line: &str) -> Vec<Token> {
    Lexer::new(line).collect()
}
