pub mod ast;
pub mod lexer;
pub mod parser;
pub mod tokens;

pub use self::ast::{Arena, Ast, Node, NodeId};
pub use self::lexer::{next_token, LexError, Lexer};
pub use self::parser::{parse, ParseError};
pub use self::tokens::{Direction, Token};
