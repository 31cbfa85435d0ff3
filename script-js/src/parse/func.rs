use super::DeclScope;
use super::ParseCtx;
use super::Parser;
use crate::ast::expr::ArrowFuncExpr;
use crate::ast::expr::FuncExpr;
use crate::ast::func::Func;
use crate::ast::func::FuncBody;
use crate::ast::node::Node;
use crate::ast::stmt::FuncDecl;
use crate::ast::stmt::Stmt;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses `(a, b)` if it is immediately followed by `=>`; otherwise rewinds and returns `None`.
  pub fn try_arrow_params(&mut self) -> Option<Vec<String>> {
    let cp = self.checkpoint();
    match self.func_params() {
      Ok(params) if self.peek().typ == TT::EqualsChevronRight => Some(params),
      _ => {
        self.restore_checkpoint(cp);
        None
      }
    }
  }

  /// Parses `x => ...` where the single parameter has no parentheses.
  pub fn arrow_func_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ArrowFuncExpr>> {
    let name = self.id_name()?;
    self.arrow_func_body(ctx, vec![name])
  }

  pub fn arrow_func_body(
    &mut self,
    ctx: ParseCtx,
    parameters: Vec<String>,
  ) -> SyntaxResult<Node<ArrowFuncExpr>> {
    let arrow = self.require(TT::EqualsChevronRight)?;
    if arrow.preceded_by_line_terminator {
      return Err(arrow.error(SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters));
    };
    let func = self.with_loc(|p| {
      let (body, strict) = if p.peek().typ == TT::BraceOpen {
        let (body, strict) = p.func_body(ctx, &parameters)?;
        (FuncBody::Block(body), strict)
      } else {
        let body_ctx = ParseCtx::for_function_body(ctx.strict);
        let expr = p.with_labels_reset(|p| p.assignment_expr(body_ctx))?;
        (FuncBody::Expression(expr), ctx.strict)
      };
      Ok(Func {
        name: None,
        arrow: true,
        strict,
        parameters,
        body,
      })
    })?;
    Ok(Node::new(arrow.loc + func.loc, ArrowFuncExpr { func }))
  }

  pub fn func_params(&mut self) -> SyntaxResult<Vec<String>> {
    self.require(TT::ParenthesisOpen)?;
    let mut params = Vec::new();
    loop {
      if self.consume_if(TT::ParenthesisClose).is_match() {
        return Ok(params);
      };
      params.push(self.id_name()?);
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::ParenthesisClose)?;
        return Ok(params);
      };
    }
  }

  /// Parses `{ ... }` as a function body, returning the statements and whether the function is
  /// strict.
  pub fn func_body(
    &mut self,
    ctx: ParseCtx,
    parameters: &[String],
  ) -> SyntaxResult<(Vec<Node<Stmt>>, bool)> {
    let start = self.require(TT::BraceOpen)?;
    let strict = ctx.strict || self.has_use_strict_directive();
    let body_ctx = ParseCtx::for_function_body(strict);
    let body = self.with_labels_reset(|p| p.stmts(body_ctx, TT::BraceClose))?;
    let end = self.require(TT::BraceClose)?;
    self.check_declarations(&body, DeclScope::Function, parameters, start.loc + end.loc)?;
    Ok((body, strict))
  }

  fn func(&mut self, ctx: ParseCtx, name_required: bool) -> SyntaxResult<Node<Func>> {
    self.with_loc(|p| {
      p.require(TT::KeywordFunction)?;
      let name = if name_required || p.peek().typ == TT::Identifier {
        Some(p.id_name()?)
      } else {
        None
      };
      let parameters = p.func_params()?;
      let (body, strict) = p.func_body(ctx, &parameters)?;
      Ok(Func {
        name,
        arrow: false,
        strict,
        parameters,
        body: FuncBody::Block(body),
      })
    })
  }

  pub fn func_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<FuncExpr>> {
    let func = self.func(ctx, false)?;
    Ok(func.wrap(|func| FuncExpr { func }))
  }

  pub fn func_decl(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<FuncDecl>> {
    let function = self.func(ctx, true)?;
    Ok(function.wrap(|function| FuncDecl { function }))
  }
}

impl Func {
  /// Number of declared parameters, used as the function's `length`.
  pub fn length(&self) -> u32 {
    self.parameters.len() as u32
  }
}
