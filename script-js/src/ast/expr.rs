use super::func::Func;
use super::node::Node;
use crate::operator::OperatorName;
use derive_more::derive::From;
use derive_visitor::Drive;
use serde::Serialize;

// Each variant wraps Node<T> so visitors can observe the concrete node type.
#[derive(Clone, Debug, Drive, From, Serialize)]
#[serde(tag = "$t")]
pub enum Expr {
  ArrowFunc(Node<ArrowFuncExpr>),
  Binary(Node<BinaryExpr>),
  Call(Node<CallExpr>),
  ComputedMember(Node<ComputedMemberExpr>),
  Cond(Node<CondExpr>),
  Func(Node<FuncExpr>),
  Id(Node<IdExpr>),
  Member(Node<MemberExpr>),
  New(Node<NewExpr>),
  NewTarget(Node<NewTarget>),
  Super(Node<SuperExpr>),
  This(Node<ThisExpr>),
  Unary(Node<UnaryExpr>),

  // Literals.
  LitBool(Node<LitBoolExpr>),
  LitNull(Node<LitNullExpr>),
  LitNum(Node<LitNumExpr>),
  LitObj(Node<LitObjExpr>),
  LitStr(Node<LitStrExpr>),
}

impl Expr {
  /// Whether this expression can appear on the left of an assignment operator.
  pub fn is_assignment_target(&self) -> bool {
    matches!(self, Expr::Id(_) | Expr::Member(_) | Expr::ComputedMember(_))
  }
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ArrowFuncExpr {
  pub func: Node<Func>, // Always has `arrow` set.
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct BinaryExpr {
  #[drive(skip)]
  pub operator: OperatorName,
  pub left: Node<Expr>,
  pub right: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct CallExpr {
  pub callee: Node<Expr>,
  pub arguments: Vec<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ComputedMemberExpr {
  pub object: Node<Expr>,
  pub member: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct CondExpr {
  pub test: Node<Expr>,
  pub consequent: Node<Expr>,
  pub alternate: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct FuncExpr {
  pub func: Node<Func>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct IdExpr {
  #[drive(skip)]
  pub name: String,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct MemberExpr {
  pub left: Node<Expr>,
  #[drive(skip)]
  pub right: String,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct NewExpr {
  pub callee: Node<Expr>,
  pub arguments: Vec<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct NewTarget {}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct SuperExpr {}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ThisExpr {}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct UnaryExpr {
  #[drive(skip)]
  pub operator: OperatorName,
  pub argument: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LitBoolExpr {
  #[drive(skip)]
  pub value: bool,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LitNullExpr {}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LitNumExpr {
  #[drive(skip)]
  pub value: f64,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LitObjExpr {
  pub members: Vec<Node<ObjMember>>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct ObjMember {
  #[drive(skip)]
  pub key: String,
  pub value: Node<Expr>,
}

#[derive(Clone, Debug, Drive, Serialize)]
pub struct LitStrExpr {
  #[drive(skip)]
  pub value: String,
}
