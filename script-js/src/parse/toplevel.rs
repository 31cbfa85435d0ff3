use super::DeclScope;
use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::stx::TopLevel;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  pub fn parse_top_level(&mut self) -> SyntaxResult<Node<TopLevel>> {
    let strict = self.has_use_strict_directive();
    let ctx = ParseCtx {
      strict,
      ..ParseCtx::default()
    };
    let body = self.stmts(ctx, TT::EOF)?;
    self.require(TT::EOF)?;
    let loc = self.source_range();
    self.check_declarations(&body, DeclScope::Function, &[], loc)?;
    Ok(Node::new(loc, TopLevel { body, strict }))
  }
}
