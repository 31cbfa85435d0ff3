//! `Contains`-based early errors for code run at the top level of a realm.
//!
//! `new.target`, `super.x`/`super[x]` and `super()` are rejected anywhere in the body, including
//! inside arrow functions, but not inside ordinary functions.

use derive_visitor::{Drive, Visitor};
use script_js::ast::expr::{CallExpr, ComputedMemberExpr, Expr, MemberExpr, NewTarget};
use script_js::ast::func::Func;
use script_js::ast::node::Node;
use script_js::ast::stmt::Stmt;
use script_js::error::{SyntaxError, SyntaxErrorType};

type FuncNode = Node<Func>;
type CallExprNode = Node<CallExpr>;
type MemberExprNode = Node<MemberExpr>;
type ComputedMemberExprNode = Node<ComputedMemberExpr>;
type NewTargetNode = Node<NewTarget>;

#[derive(Visitor, Default)]
#[visitor(
  FuncNode,
  CallExprNode(enter),
  MemberExprNode(enter),
  ComputedMemberExprNode(enter),
  NewTargetNode(enter)
)]
struct RestrictedSyntaxVisitor {
  // Ordinary functions entered and not yet exited.
  function_depth: usize,
  errors: Vec<SyntaxError>,
}

fn is_super(expr: &Node<Expr>) -> bool {
  matches!(expr.stx.as_ref(), Expr::Super(_))
}

impl RestrictedSyntaxVisitor {
  fn report(&mut self, error: SyntaxError) {
    if self.function_depth == 0 {
      self.errors.push(error);
    }
  }

  fn enter_func_node(&mut self, node: &FuncNode) {
    if !node.stx.arrow {
      self.function_depth += 1;
    }
  }

  fn exit_func_node(&mut self, node: &FuncNode) {
    if !node.stx.arrow {
      self.function_depth -= 1;
    }
  }

  fn enter_call_expr_node(&mut self, node: &CallExprNode) {
    if is_super(&node.stx.callee) {
      self.report(node.error(SyntaxErrorType::UnexpectedSuperCall));
    }
  }

  fn enter_member_expr_node(&mut self, node: &MemberExprNode) {
    if is_super(&node.stx.left) {
      self.report(node.error(SyntaxErrorType::UnexpectedSuperProperty));
    }
  }

  fn enter_computed_member_expr_node(&mut self, node: &ComputedMemberExprNode) {
    if is_super(&node.stx.object) {
      self.report(node.error(SyntaxErrorType::UnexpectedSuperProperty));
    }
  }

  fn enter_new_target_node(&mut self, node: &NewTargetNode) {
    self.report(node.error(SyntaxErrorType::UnexpectedNewTarget));
  }
}

/// Syntax errors for `new.target` and `super` uses outside any ordinary function, in source order.
pub(crate) fn early_errors(body: &[Node<Stmt>]) -> Vec<SyntaxError> {
  let mut visitor = RestrictedSyntaxVisitor::default();
  for stmt in body {
    stmt.drive(&mut visitor);
  }
  visitor.errors
}
