//! Parser for the ECMAScript subset evaluated by `realm-js`.
//!
//! The AST follows the usual shape: every syntax struct is wrapped in a [`Node`](ast::node::Node)
//! carrying its source location, enum-like syntax types wrap `Node<T>` per variant so visitors
//! (via `derive-visitor`) observe concrete node types, and serialization emits only the syntax,
//! tagged with `$t`.

use ast::node::Node;
use ast::stx::TopLevel;
use error::SyntaxResult;
use lex::Lexer;
use parse::Parser;

pub mod ast;
pub mod char;
pub mod decls;
pub mod error;
pub mod lex;
pub mod loc;
pub mod num;
pub mod operator;
pub mod parse;
pub mod token;

pub fn parse(source: &str) -> SyntaxResult<Node<TopLevel>> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer)?;
  parser.parse_top_level()
}
