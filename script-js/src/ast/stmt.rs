use super::expr::Expr;
use super::func::Func;
use super::node::Node;
use derive_more::derive::From;
use derive_visitor::Drive;
use serde::Serialize;

#[derive(Clone, Debug, Drive, From, Serialize)]
#[serde(tag = "$t")]
pub enum Stmt {
  Block(Node<BlockStmt>),
  Break(Node<BreakStmt>),
  Continue(Node<ContinueStmt>),
  DoWhile(Node<DoWhileStmt>),
  Empty(Node<EmptyStmt>),
  Expr(Node<ExprStmt>),
  ForTriple(Node<ForTripleStmt>),
  FunctionDecl(Node<FuncDecl>),
  If(Node<IfStmt>),
  Label(Node<LabelStmt>),
  Return(Node<ReturnStmt>),
  Throw(Node<ThrowStmt>),
  Try(Node<TryStmt>),
  VarDecl(Node<VarDecl>),
  While(Node<WhileStmt>),
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct BlockStmt {
  pub body: Vec<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct BreakStmt {
  #[drive(skip)]
  pub label: Option<String>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct CatchBlock {
  #[drive(skip)]
  pub parameter: Option<String>,
  // Not a BlockStmt: the catch scope starts with the parameter, not the braces.
  pub body: Vec<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ContinueStmt {
  #[drive(skip)]
  pub label: Option<String>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct DoWhileStmt {
  pub condition: Node<Expr>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct EmptyStmt {}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ExprStmt {
  pub expr: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ForTripleStmt {
  pub init: ForTripleStmtInit,
  pub cond: Option<Node<Expr>>,
  pub post: Option<Node<Expr>>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub enum ForTripleStmtInit {
  None,
  Expr(Node<Expr>),
  Decl(Node<VarDecl>),
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct FuncDecl {
  pub function: Node<Func>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct IfStmt {
  pub test: Node<Expr>,
  pub consequent: Node<Stmt>,
  pub alternate: Option<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LabelStmt {
  #[drive(skip)]
  pub name: String,
  pub statement: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ReturnStmt {
  pub value: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ThrowStmt {
  pub value: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct TryStmt {
  pub wrapped: Node<BlockStmt>,
  // One of these must be present.
  pub catch: Option<Node<CatchBlock>>,
  pub finally: Option<Node<BlockStmt>>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum VarDeclMode {
  Const,
  Let,
  Var,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct VarDecl {
  #[drive(skip)]
  pub mode: VarDeclMode,
  pub declarators: Vec<VarDeclarator>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct VarDeclarator {
  #[drive(skip)]
  pub name: String,
  pub initializer: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct WhileStmt {
  pub condition: Node<Expr>,
  pub body: Node<Stmt>,
}
