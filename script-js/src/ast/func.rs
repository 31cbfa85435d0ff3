use super::expr::Expr;
use super::node::Node;
use super::stmt::Stmt;
use derive_visitor::Drive;
use serde::Serialize;

#[derive(Clone, Debug, Drive, Serialize)]
pub struct Func {
  #[drive(skip)]
  pub name: Option<String>,
  #[drive(skip)]
  pub arrow: bool,
  // True if the function body has its own "use strict" directive or the function is nested in
  // strict code.
  #[drive(skip)]
  pub strict: bool,
  #[drive(skip)]
  pub parameters: Vec<String>,
  pub body: FuncBody,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub enum FuncBody {
  // Not a BlockStmt: the function scope starts with the parameters, not the braces.
  Block(Vec<Node<Stmt>>),
  // Concise arrow function body.
  Expression(Node<Expr>),
}
