use super::ActiveLabel;
use super::DeclScope;
use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::stmt::BlockStmt;
use crate::ast::stmt::BreakStmt;
use crate::ast::stmt::CatchBlock;
use crate::ast::stmt::ContinueStmt;
use crate::ast::stmt::DoWhileStmt;
use crate::ast::stmt::EmptyStmt;
use crate::ast::stmt::ExprStmt;
use crate::ast::stmt::ForTripleStmt;
use crate::ast::stmt::ForTripleStmtInit;
use crate::ast::stmt::IfStmt;
use crate::ast::stmt::LabelStmt;
use crate::ast::stmt::ReturnStmt;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::ThrowStmt;
use crate::ast::stmt::TryStmt;
use crate::ast::stmt::VarDecl;
use crate::ast::stmt::VarDeclMode;
use crate::ast::stmt::VarDeclarator;
use crate::ast::stmt::WhileStmt;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum VarDeclParseMode {
  // Standard parsing mode for var statement.
  Asi,
  // Parse as many valid declarators as possible, then break before the first invalid token (e.g.
  // the `;` in a `for` header). Used by for-loop initialisers.
  Leftmost,
}

impl<'a> Parser<'a> {
  pub fn stmts(&mut self, ctx: ParseCtx, end: TT) -> SyntaxResult<Vec<Node<Stmt>>> {
    self.repeat_until_tt(end, |p| p.stmt(ctx))
  }

  pub fn stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    self.nested(|p| p.stmt_at_current_depth(ctx))
  }

  fn stmt_at_current_depth(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<Stmt>> {
    let [t0, t1] = self.peek_n();
    #[rustfmt::skip]
    let stmt: Node<Stmt> = match t0.typ {
      TT::BraceOpen => self.block_stmt(ctx)?.into_wrapped(),
      TT::KeywordBreak => self.break_stmt(ctx)?.into_wrapped(),
      TT::KeywordConst | TT::KeywordLet | TT::KeywordVar => self.var_decl(ctx, VarDeclParseMode::Asi)?.into_wrapped(),
      TT::KeywordContinue => self.continue_stmt(ctx)?.into_wrapped(),
      TT::KeywordDo => self.do_while_stmt(ctx)?.into_wrapped(),
      TT::KeywordFor => self.for_stmt(ctx)?.into_wrapped(),
      TT::KeywordFunction => self.func_decl(ctx)?.into_wrapped(),
      TT::KeywordIf => self.if_stmt(ctx)?.into_wrapped(),
      TT::KeywordReturn => self.return_stmt(ctx)?.into_wrapped(),
      TT::KeywordThrow => self.throw_stmt(ctx)?.into_wrapped(),
      TT::KeywordTry => self.try_stmt(ctx)?.into_wrapped(),
      TT::KeywordWhile => self.while_stmt(ctx)?.into_wrapped(),
      TT::Semicolon => self.empty_stmt()?.into_wrapped(),
      TT::Identifier if t1.typ == TT::Colon => self.label_stmt(ctx)?.into_wrapped(),
      _ => self.expr_stmt(ctx)?.into_wrapped(),
    };
    Ok(stmt)
  }

  pub fn block_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<BlockStmt>> {
    let block = self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let body = p.stmts(ctx, TT::BraceClose)?;
      p.require(TT::BraceClose)?;
      Ok(BlockStmt { body })
    })?;
    self.check_declarations(&block.stx.body, DeclScope::Block, &[], block.loc)?;
    Ok(block)
  }

  fn optional_label(&mut self) -> Option<String> {
    let t = self.peek();
    if t.typ == TT::Identifier && !t.preceded_by_line_terminator {
      Some(self.consume_as_string())
    } else {
      None
    }
  }

  pub fn break_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<BreakStmt>> {
    self.with_loc(|p| {
      let t = p.require(TT::KeywordBreak)?;
      let label = p.optional_label();
      let valid = match &label {
        Some(name) => p.labels.iter().any(|l| &l.name == name),
        None => ctx.in_iteration,
      };
      if !valid {
        return Err(t.error(SyntaxErrorType::IllegalBreak));
      };
      p.require_semicolon_or_asi()?;
      Ok(BreakStmt { label })
    })
  }

  pub fn continue_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ContinueStmt>> {
    self.with_loc(|p| {
      let t = p.require(TT::KeywordContinue)?;
      let label = p.optional_label();
      let valid = ctx.in_iteration
        && match &label {
          Some(name) => p.labels.iter().any(|l| &l.name == name && l.iteration),
          None => true,
        };
      if !valid {
        return Err(t.error(SyntaxErrorType::IllegalContinue));
      };
      p.require_semicolon_or_asi()?;
      Ok(ContinueStmt { label })
    })
  }

  pub fn var_decl(&mut self, ctx: ParseCtx, parse_mode: VarDeclParseMode) -> SyntaxResult<Node<VarDecl>> {
    self.with_loc(|p| {
      let t = p.consume();
      let mode = match t.typ {
        TT::KeywordConst => VarDeclMode::Const,
        TT::KeywordLet => VarDeclMode::Let,
        TT::KeywordVar => VarDeclMode::Var,
        _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("variable declaration"))),
      };
      let mut declarators = Vec::new();
      loop {
        let name_tok = p.peek();
        let name = p.id_name()?;
        let initializer = if p.consume_if(TT::Equals).is_match() {
          Some(p.assignment_expr(ctx)?)
        } else {
          None
        };
        if mode == VarDeclMode::Const && initializer.is_none() {
          return Err(name_tok.error(SyntaxErrorType::ExpectedSyntax("const initializer")));
        };
        declarators.push(VarDeclarator { name, initializer });
        if !p.consume_if(TT::Comma).is_match() {
          break;
        };
      }
      if parse_mode == VarDeclParseMode::Asi {
        p.require_semicolon_or_asi()?;
      };
      Ok(VarDecl { mode, declarators })
    })
  }

  pub fn do_while_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<DoWhileStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordDo)?;
      let body = p.stmt(ctx.with_iteration())?;
      p.require(TT::KeywordWhile)?;
      p.require(TT::ParenthesisOpen)?;
      let condition = p.expr(ctx)?;
      p.require(TT::ParenthesisClose)?;
      // The semicolon after do-while is always optional.
      let _ = p.consume_if(TT::Semicolon);
      Ok(DoWhileStmt { condition, body })
    })
  }

  pub fn for_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ForTripleStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordFor)?;
      p.require(TT::ParenthesisOpen)?;
      let init = match p.peek().typ {
        TT::Semicolon => ForTripleStmtInit::None,
        TT::KeywordConst | TT::KeywordLet | TT::KeywordVar => {
          ForTripleStmtInit::Decl(p.var_decl(ctx, VarDeclParseMode::Leftmost)?)
        }
        _ => ForTripleStmtInit::Expr(p.expr(ctx)?),
      };
      p.require(TT::Semicolon)?;
      let cond = if p.peek().typ == TT::Semicolon {
        None
      } else {
        Some(p.expr(ctx)?)
      };
      p.require(TT::Semicolon)?;
      let post = if p.peek().typ == TT::ParenthesisClose {
        None
      } else {
        Some(p.expr(ctx)?)
      };
      p.require(TT::ParenthesisClose)?;
      let body = p.stmt(ctx.with_iteration())?;
      Ok(ForTripleStmt {
        init,
        cond,
        post,
        body,
      })
    })
  }

  pub fn if_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<IfStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordIf)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.expr(ctx)?;
      p.require(TT::ParenthesisClose)?;
      let consequent = p.stmt(ctx)?;
      let alternate = if p.consume_if(TT::KeywordElse).is_match() {
        Some(p.stmt(ctx)?)
      } else {
        None
      };
      Ok(IfStmt {
        test,
        consequent,
        alternate,
      })
    })
  }

  // Whether the statement after the label (skipping further labels) is a loop.
  fn labels_iteration_stmt(&self) -> bool {
    let mut cp = self.next_tok_i;
    loop {
      let [a, b] = [self.token_at(cp), self.token_at(cp + 1)];
      if a.typ == TT::Identifier && b.typ == TT::Colon {
        cp += 2;
        continue;
      };
      return matches!(a.typ, TT::KeywordDo | TT::KeywordFor | TT::KeywordWhile);
    }
  }

  pub fn label_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<LabelStmt>> {
    self.with_loc(|p| {
      let name = p.id_name()?;
      p.require(TT::Colon)?;
      let iteration = p.labels_iteration_stmt();
      p.labels.push(ActiveLabel {
        name: name.clone(),
        iteration,
      });
      let statement = p.stmt(ctx);
      p.labels.pop();
      Ok(LabelStmt {
        name,
        statement: statement?,
      })
    })
  }

  pub fn return_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ReturnStmt>> {
    self.with_loc(|p| {
      let t = p.require(TT::KeywordReturn)?;
      if !ctx.in_function {
        return Err(t.error(SyntaxErrorType::IllegalReturn));
      };
      let next = p.peek();
      let value = if next.preceded_by_line_terminator
        || matches!(next.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
      {
        None
      } else {
        Some(p.expr(ctx)?)
      };
      p.require_semicolon_or_asi()?;
      Ok(ReturnStmt { value })
    })
  }

  pub fn throw_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ThrowStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordThrow)?;
      let next = p.peek();
      if next.preceded_by_line_terminator {
        // Illegal under Automatic Semicolon Insertion rules.
        return Err(next.error(SyntaxErrorType::LineTerminatorAfterThrow));
      };
      let value = p.expr(ctx)?;
      p.require_semicolon_or_asi()?;
      Ok(ThrowStmt { value })
    })
  }

  pub fn try_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<TryStmt>> {
    self.with_loc(|p| {
      let t = p.require(TT::KeywordTry)?;
      let wrapped = p.block_stmt(ctx)?;
      let catch = if p.consume_if(TT::KeywordCatch).is_match() {
        Some(p.with_loc(|p| {
          let parameter = if p.consume_if(TT::ParenthesisOpen).is_match() {
            let name = p.id_name()?;
            p.require(TT::ParenthesisClose)?;
            Some(name)
          } else {
            None
          };
          let start = p.require(TT::BraceOpen)?;
          let body = p.stmts(ctx, TT::BraceClose)?;
          let end = p.require(TT::BraceClose)?;
          let bound: Vec<String> = parameter.iter().cloned().collect();
          p.check_declarations(&body, DeclScope::Block, &bound, start.loc + end.loc)?;
          Ok(CatchBlock { parameter, body })
        })?)
      } else {
        None
      };
      let finally = if p.consume_if(TT::KeywordFinally).is_match() {
        Some(p.block_stmt(ctx)?)
      } else {
        None
      };
      if catch.is_none() && finally.is_none() {
        return Err(t.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
      };
      Ok(TryStmt {
        wrapped,
        catch,
        finally,
      })
    })
  }

  pub fn while_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<WhileStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordWhile)?;
      p.require(TT::ParenthesisOpen)?;
      let condition = p.expr(ctx)?;
      p.require(TT::ParenthesisClose)?;
      let body = p.stmt(ctx.with_iteration())?;
      Ok(WhileStmt { condition, body })
    })
  }

  pub fn empty_stmt(&mut self) -> SyntaxResult<Node<EmptyStmt>> {
    self.with_loc(|p| {
      p.require(TT::Semicolon)?;
      Ok(EmptyStmt {})
    })
  }

  pub fn expr_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node<ExprStmt>> {
    self.with_loc(|p| {
      let expr = p.expr(ctx)?;
      p.require_semicolon_or_asi()?;
      Ok(ExprStmt { expr })
    })
  }
}
