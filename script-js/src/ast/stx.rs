use super::node::Node;
use super::stmt::Stmt;
use derive_visitor::Drive;
use serde::Serialize;

#[derive(Clone, Debug, Drive, Serialize)]
pub struct TopLevel {
  pub body: Vec<Node<Stmt>>,
  // Set when the body begins with a "use strict" directive.
  #[drive(skip)]
  pub strict: bool,
}
