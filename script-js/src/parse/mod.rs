use crate::ast::node::Node;
use crate::ast::stmt::Stmt;
use crate::decls::function_declarations;
use crate::decls::lexically_declared_names;
use crate::decls::var_declared_names;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::Drive;

pub mod expr;
pub mod func;
pub mod literal;
pub mod stmt;
#[cfg(test)]
mod tests;
pub mod toplevel;

// Almost every parse_* function takes these field values as parameters. The struct is passed by
// value and altered copies are made with the with_* methods, so nothing needs to be "unwound" after
// a nested call returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseCtx {
  pub strict: bool,
  pub in_function: bool,
  pub in_iteration: bool,
}

impl ParseCtx {
  pub fn with_iteration(&self) -> ParseCtx {
    ParseCtx {
      in_iteration: true,
      ..*self
    }
  }

  pub fn for_function_body(strict: bool) -> ParseCtx {
    ParseCtx {
      strict,
      in_function: true,
      in_iteration: false,
    }
  }
}

#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn match_loc(&self) -> Option<Loc> {
    if self.matched {
      Some(self.loc)
    } else {
      None
    }
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }
}

pub struct ParserCheckpoint {
  next_tok_i: usize,
}

/// A label in scope for `break`/`continue` validation.
#[derive(Clone, Debug)]
pub struct ActiveLabel {
  pub name: String,
  // Whether the label is attached to an iteration statement, making it a valid `continue` target.
  pub iteration: bool,
}

/// Which declaration rules apply to a statement list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclScope {
  // Script or function body: function declarations are var-scoped.
  Function,
  // Block or catch body: function declarations are lexically scoped.
  Block,
}

/// Deepest syntactic nesting accepted before parsing fails with
/// [`SyntaxErrorType::NestingTooDeep`]. Statements, full expressions and unary operands each count
/// as one level.
pub const MAX_NESTING_DEPTH: usize = 128;

pub struct Parser<'a> {
  source: &'a str,
  tokens: Vec<Token>,
  next_tok_i: usize,
  labels: Vec<ActiveLabel>,
  nesting: usize,
}

impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>) -> SyntaxResult<Parser<'a>> {
    let source = lexer.source();
    let tokens = lexer.tokenize()?;
    Ok(Parser {
      source,
      tokens,
      next_tok_i: 0,
      labels: Vec::new(),
      nesting: 0,
    })
  }

  pub fn source_range(&self) -> Loc {
    Loc(0, self.source.len())
  }

  pub fn str(&self, loc: Loc) -> &'a str {
    &self.source[loc.0..loc.1]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
    }
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
  }

  fn token_at(&self, i: usize) -> Token {
    // The token list always ends with EOF, which is repeated indefinitely.
    self.tokens[i.min(self.tokens.len() - 1)]
  }

  pub fn peek(&self) -> Token {
    self.token_at(self.next_tok_i)
  }

  pub fn peek_n<const N: usize>(&self) -> [Token; N] {
    std::array::from_fn(|i| self.token_at(self.next_tok_i + i))
  }

  pub fn consume(&mut self) -> Token {
    let t = self.peek();
    if t.typ != TT::EOF {
      self.next_tok_i += 1;
    }
    t
  }

  /// Consumes the next token regardless of type, and returns its raw source code as a string.
  pub fn consume_as_string(&mut self) -> String {
    let loc = self.consume().loc;
    self.string(loc)
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    let t = self.peek();
    let matched = t.typ == typ;
    if matched {
      self.consume();
    }
    MaybeToken {
      typ: t.typ,
      loc: t.loc,
      matched,
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    let t = self.peek();
    if t.typ != typ {
      return Err(if t.typ == TT::EOF {
        t.loc.error(SyntaxErrorType::UnexpectedEnd, Some(typ))
      } else {
        t.error(SyntaxErrorType::RequiredTokenNotFound(typ))
      });
    }
    Ok(self.consume())
  }

  /// Requires a statement terminator, applying automatic semicolon insertion.
  pub fn require_semicolon_or_asi(&mut self) -> SyntaxResult<()> {
    let t = self.peek();
    match t.typ {
      TT::Semicolon => {
        self.consume();
        Ok(())
      }
      TT::BraceClose | TT::EOF => Ok(()),
      _ if t.preceded_by_line_terminator => Ok(()),
      _ => Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon))),
    }
  }

  fn prev_end(&self) -> usize {
    match self.next_tok_i {
      0 => 0,
      i => self.token_at(i - 1).loc.1,
    }
  }

  /// Runs `f` and wraps its result in a node spanning every token it consumed.
  pub fn with_loc<S: Drive, F: FnOnce(&mut Self) -> SyntaxResult<S>>(
    &mut self,
    f: F,
  ) -> SyntaxResult<Node<S>> {
    let start = self.peek().loc.0;
    let stx = f(self)?;
    let end = self.prev_end().max(start);
    Ok(Node::new(Loc(start, end), stx))
  }

  pub fn repeat_until_tt<T, F: FnMut(&mut Self) -> SyntaxResult<T>>(
    &mut self,
    end: TT,
    mut f: F,
  ) -> SyntaxResult<Vec<T>> {
    let mut items = Vec::new();
    while self.peek().typ != end && self.peek().typ != TT::EOF {
      items.push(f(self)?);
    }
    Ok(items)
  }

  /// Whether the upcoming statement list begins with a "use strict" directive.
  ///
  /// Only exact, escape-free `'use strict'` or `"use strict"` string literal statements count, and
  /// only within the leading run of string literal statements.
  pub fn has_use_strict_directive(&self) -> bool {
    let mut i = self.next_tok_i;
    loop {
      let t = self.token_at(i);
      if t.typ != TT::LiteralString {
        return false;
      }
      let next = self.token_at(i + 1);
      let terminated = matches!(next.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
        || next.preceded_by_line_terminator;
      if !terminated {
        return false;
      }
      let raw = self.str(t.loc);
      if raw == "'use strict'" || raw == "\"use strict\"" {
        return true;
      }
      i += if next.typ == TT::Semicolon { 2 } else { 1 };
    }
  }

  /// Runs `f` one nesting level deeper.
  pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    if self.nesting >= MAX_NESTING_DEPTH {
      return Err(self.peek().error(SyntaxErrorType::NestingTooDeep));
    }
    self.nesting += 1;
    let result = f(self);
    self.nesting -= 1;
    result
  }

  pub(crate) fn with_labels_reset<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
    let outer = std::mem::take(&mut self.labels);
    let result = f(self);
    self.labels = outer;
    result
  }

  /// Checks the early errors for conflicting declarations within one statement list.
  ///
  /// `bound` lists names already bound in the same scope (function parameters or a catch
  /// parameter) that may not be redeclared lexically.
  pub fn check_declarations(
    &self,
    stmts: &[Node<Stmt>],
    scope: DeclScope,
    bound: &[String],
    loc: Loc,
  ) -> SyntaxResult<()> {
    let duplicate = || loc.error(SyntaxErrorType::DuplicateDeclaration, None);
    let mut lexical = HashSet::<&str>::new();
    for decl in lexically_declared_names(stmts) {
      if !lexical.insert(decl.name) {
        return Err(duplicate());
      }
    }
    let mut var_names = var_declared_names(stmts);
    for func in function_declarations(stmts) {
      let Some(name) = func.stx.name.as_deref() else {
        continue;
      };
      match scope {
        DeclScope::Function => var_names.push(name),
        DeclScope::Block => {
          if !lexical.insert(name) {
            return Err(duplicate());
          }
        }
      }
    }
    if var_names.iter().any(|name| lexical.contains(name)) {
      return Err(duplicate());
    }
    if bound.iter().any(|name| lexical.contains(name.as_str())) {
      return Err(duplicate());
    }
    Ok(())
  }
}
