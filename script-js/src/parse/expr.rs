use super::literal::normalise_literal_number;
use super::literal::normalise_literal_string;
use super::ParseCtx;
use super::Parser;
use crate::ast::expr::BinaryExpr;
use crate::ast::expr::CallExpr;
use crate::ast::expr::ComputedMemberExpr;
use crate::ast::expr::CondExpr;
use crate::ast::expr::Expr;
use crate::ast::expr::IdExpr;
use crate::ast::expr::LitBoolExpr;
use crate::ast::expr::LitNullExpr;
use crate::ast::expr::LitNumExpr;
use crate::ast::expr::LitObjExpr;
use crate::ast::expr::LitStrExpr;
use crate::ast::expr::MemberExpr;
use crate::ast::expr::NewExpr;
use crate::ast::expr::NewTarget;
use crate::ast::expr::ObjMember;
use crate::ast::expr::SuperExpr;
use crate::ast::expr::ThisExpr;
use crate::ast::expr::UnaryExpr;
use crate::ast::node::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::num::number_to_key;
use crate::operator::Associativity;
use crate::operator::BINARY_OPERATOR_MAPPING;
use crate::operator::PRECEDENCE_ASSIGNMENT;
use crate::operator::PRECEDENCE_CONDITIONAL;
use crate::operator::UNARY_OPERATOR_MAPPING;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a full expression (the lowest precedence level supported).
  pub fn expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    self.expr_with_min_prec(ctx, 1)
  }

  pub fn assignment_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    self.expr_with_min_prec(ctx, PRECEDENCE_ASSIGNMENT)
  }

  pub fn expr_with_min_prec(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<Node<Expr>> {
    self.nested(|p| p.operators_with_min_prec(ctx, min_prec))
  }

  fn operators_with_min_prec(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<Node<Expr>> {
    let mut left = self.expr_operand(ctx)?;

    loop {
      let t = self.peek();

      if t.typ == TT::Question {
        if PRECEDENCE_CONDITIONAL < min_prec {
          break;
        };
        self.consume();
        let consequent = self.assignment_expr(ctx)?;
        self.require(TT::Colon)?;
        let alternate = self.assignment_expr(ctx)?;
        left = Node::new(left.loc + alternate.loc, CondExpr {
          test: left,
          consequent,
          alternate,
        })
        .into_wrapped();
        continue;
      };

      let Some(operator) = BINARY_OPERATOR_MAPPING.get(&t.typ).copied() else {
        break;
      };
      if operator.precedence < min_prec {
        break;
      };
      self.consume();
      if operator.name.is_assignment() && !left.stx.is_assignment_target() {
        return Err(left.error(SyntaxErrorType::InvalidAssigmentTarget));
      };
      let next_min_prec =
        operator.precedence + (operator.associativity == Associativity::Left) as u8;
      let right = self.expr_with_min_prec(ctx, next_min_prec)?;
      left = Node::new(left.loc + right.loc, BinaryExpr {
        operator: operator.name,
        left,
        right,
      })
      .into_wrapped();
    }

    Ok(left)
  }

  fn expr_operand(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let t = self.peek();
    if let Some(operator) = UNARY_OPERATOR_MAPPING.get(&t.typ).copied() {
      self.consume();
      let argument = self.nested(|p| p.expr_operand(ctx))?;
      return Ok(
        Node::new(t.loc + argument.loc, UnaryExpr {
          operator: operator.name,
          argument,
        })
        .into_wrapped(),
      );
    };
    let mut left = self.primary_expr(ctx)?;
    loop {
      match self.peek().typ {
        TT::Dot | TT::BracketOpen => left = self.member_access(ctx, left)?,
        TT::ParenthesisOpen => {
          let (arguments, end) = self.call_args(ctx)?;
          left = Node::new(left.loc + end, CallExpr {
            callee: left,
            arguments,
          })
          .into_wrapped();
        }
        _ => break,
      };
    }
    Ok(left)
  }

  fn member_access(&mut self, ctx: ParseCtx, left: Node<Expr>) -> SyntaxResult<Node<Expr>> {
    if self.consume_if(TT::Dot).is_match() {
      let prop = self.peek();
      if !prop.typ.is_identifier_name() {
        return Err(prop.error(SyntaxErrorType::ExpectedSyntax("property name")));
      };
      let right = self.consume_as_string();
      return Ok(
        Node::new(left.loc + prop.loc, MemberExpr { left, right }).into_wrapped(),
      );
    };
    self.require(TT::BracketOpen)?;
    let member = self.expr(ctx)?;
    let end = self.require(TT::BracketClose)?;
    Ok(
      Node::new(left.loc + end.loc, ComputedMemberExpr {
        object: left,
        member,
      })
      .into_wrapped(),
    )
  }

  /// Parses `(a, b, ...)`, returning the arguments and the location of the closing parenthesis.
  pub fn call_args(&mut self, ctx: ParseCtx) -> SyntaxResult<(Vec<Node<Expr>>, Loc)> {
    self.require(TT::ParenthesisOpen)?;
    let mut args = Vec::new();
    loop {
      if let Some(end) = self.consume_if(TT::ParenthesisClose).match_loc() {
        return Ok((args, end));
      };
      args.push(self.assignment_expr(ctx)?);
      if !self.consume_if(TT::Comma).is_match() {
        let end = self.require(TT::ParenthesisClose)?;
        return Ok((args, end.loc));
      };
    }
  }

  fn primary_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    let [t0, t1] = self.peek_n();
    #[rustfmt::skip]
    let expr: Node<Expr> = match t0.typ {
      TT::BraceOpen => self.lit_obj(ctx)?.into_wrapped(),
      TT::Identifier if t1.typ == TT::EqualsChevronRight => self.arrow_func_expr(ctx)?.into_wrapped(),
      TT::Identifier => self.id_expr()?.into_wrapped(),
      TT::KeywordFunction => self.func_expr(ctx)?.into_wrapped(),
      TT::KeywordNew if t1.typ == TT::Dot => self.new_target()?.into_wrapped(),
      TT::KeywordNew => self.new_expr(ctx)?.into_wrapped(),
      TT::KeywordSuper => self.super_expr()?.into_wrapped(),
      TT::KeywordThis => self.this_expr()?.into_wrapped(),
      TT::LiteralFalse | TT::LiteralTrue => self.with_loc(|p| {
        let value = p.consume().typ == TT::LiteralTrue;
        Ok(LitBoolExpr { value })
      })?.into_wrapped(),
      TT::LiteralNull => self.with_loc(|p| {
        p.consume();
        Ok(LitNullExpr {})
      })?.into_wrapped(),
      TT::LiteralNumber => self.with_loc(|p| {
        let t = p.consume();
        let value = normalise_literal_number(p.str(t.loc), t.loc)?;
        Ok(LitNumExpr { value })
      })?.into_wrapped(),
      TT::LiteralString => self.with_loc(|p| {
        let t = p.consume();
        let value = normalise_literal_string(p.str(t.loc), t.loc)?;
        Ok(LitStrExpr { value })
      })?.into_wrapped(),
      TT::ParenthesisOpen => self.arrow_function_or_grouping_expr(ctx)?,
      TT::EOF => return Err(t0.loc.error(SyntaxErrorType::UnexpectedEnd, None)),
      _ => return Err(t0.error(SyntaxErrorType::ExpectedSyntax("expression"))),
    };
    Ok(expr)
  }

  fn arrow_function_or_grouping_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Expr>> {
    if let Some(parameters) = self.try_arrow_params() {
      return Ok(self.arrow_func_body(ctx, parameters)?.into_wrapped());
    };
    let start = self.require(TT::ParenthesisOpen)?;
    let mut inner = self.expr(ctx)?;
    let end = self.require(TT::ParenthesisClose)?;
    inner.loc = start.loc + end.loc;
    Ok(inner)
  }

  pub fn id_expr(&mut self) -> SyntaxResult<Node<IdExpr>> {
    self.with_loc(|p| {
      let name = p.id_name()?;
      Ok(IdExpr { name })
    })
  }

  pub fn id_name(&mut self) -> SyntaxResult<String> {
    let t = self.require(TT::Identifier)?;
    Ok(self.string(t.loc))
  }

  pub fn new_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<NewExpr>> {
    self.with_loc(|p| {
      p.require(TT::KeywordNew)?;
      // The callee is a member expression: `new a.b()` constructs `a.b`, it does not call `a.b`
      // and construct the result.
      let mut callee = p.primary_expr(ctx)?;
      while matches!(p.peek().typ, TT::Dot | TT::BracketOpen) {
        callee = p.member_access(ctx, callee)?;
      }
      let arguments = if p.peek().typ == TT::ParenthesisOpen {
        p.call_args(ctx)?.0
      } else {
        Vec::new()
      };
      Ok(NewExpr { callee, arguments })
    })
  }

  pub fn lit_obj(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<LitObjExpr>> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let mut members = Vec::new();
      while p.peek().typ != TT::BraceClose {
        members.push(p.obj_member(ctx)?);
        if !p.consume_if(TT::Comma).is_match() {
          break;
        };
      }
      p.require(TT::BraceClose)?;
      Ok(LitObjExpr { members })
    })
  }

  fn obj_member(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ObjMember>> {
    self.with_loc(|p| {
      let t = p.consume();
      let key = match t.typ {
        TT::LiteralString => normalise_literal_string(p.str(t.loc), t.loc)?,
        TT::LiteralNumber => number_to_key(normalise_literal_number(p.str(t.loc), t.loc)?),
        typ if typ.is_identifier_name() => p.string(t.loc),
        TT::EOF => return Err(t.loc.error(SyntaxErrorType::UnexpectedEnd, None)),
        _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("property name"))),
      };
      // Shorthand `{ a }`.
      if t.typ == TT::Identifier && matches!(p.peek().typ, TT::Comma | TT::BraceClose) {
        let value = Node::new(t.loc, IdExpr { name: key.clone() }).into_wrapped();
        return Ok(ObjMember { key, value });
      };
      p.require(TT::Colon)?;
      let value = p.assignment_expr(ctx)?;
      Ok(ObjMember { key, value })
    })
  }

  pub fn super_expr(&mut self) -> SyntaxResult<Node<SuperExpr>> {
    self.with_loc(|p| {
      p.require(TT::KeywordSuper)?;
      let next = p.peek();
      if !matches!(next.typ, TT::Dot | TT::BracketOpen | TT::ParenthesisOpen) {
        return Err(next.error(SyntaxErrorType::ExpectedSyntax("`super` property access or call")));
      };
      Ok(SuperExpr {})
    })
  }

  pub fn this_expr(&mut self) -> SyntaxResult<Node<ThisExpr>> {
    self.with_loc(|p| {
      p.require(TT::KeywordThis)?;
      Ok(ThisExpr {})
    })
  }

  pub fn new_target(&mut self) -> SyntaxResult<Node<NewTarget>> {
    self.with_loc(|p| {
      p.require(TT::KeywordNew)?;
      p.require(TT::Dot)?;
      let prop = p.require(TT::Identifier)?;
      if p.str(prop.loc) != "target" {
        return Err(prop.error(SyntaxErrorType::ExpectedSyntax("`target` property")));
      };
      Ok(NewTarget {})
    })
  }
}
