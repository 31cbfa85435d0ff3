use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum OperatorName {
  Addition,
  Assignment,
  AssignmentAddition,
  AssignmentMultiplication,
  AssignmentSubtraction,
  Conditional,
  Division,
  Equality,
  GreaterThan,
  GreaterThanOrEqual,
  Inequality,
  LessThan,
  LessThanOrEqual,
  LogicalAnd,
  LogicalNot,
  LogicalOr,
  Multiplication,
  NullishCoalescing,
  Remainder,
  StrictEquality,
  StrictInequality,
  Subtraction,
  Typeof,
  UnaryNegation,
  UnaryPlus,
  Void,
}

impl OperatorName {
  pub fn is_assignment(self) -> bool {
    matches!(
      self,
      OperatorName::Assignment
        | OperatorName::AssignmentAddition
        | OperatorName::AssignmentMultiplication
        | OperatorName::AssignmentSubtraction
    )
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Associativity {
  Left,
  Right,
}

pub struct Operator {
  pub name: OperatorName,
  pub associativity: Associativity,
  pub precedence: u8,
}

pub const PRECEDENCE_ASSIGNMENT: u8 = 2;
pub const PRECEDENCE_CONDITIONAL: u8 = 3;

#[rustfmt::skip]
pub static OPERATORS: Lazy<HashMap<OperatorName, Operator>> = Lazy::new(|| {
  let mut map = HashMap::<OperatorName, Operator>::new();
  let mut add = |name, associativity, precedence| {
    map.insert(name, Operator { name, associativity, precedence });
  };
  use Associativity::*;
  use OperatorName::*;
  add(Assignment, Right, PRECEDENCE_ASSIGNMENT);
  add(AssignmentAddition, Right, PRECEDENCE_ASSIGNMENT);
  add(AssignmentMultiplication, Right, PRECEDENCE_ASSIGNMENT);
  add(AssignmentSubtraction, Right, PRECEDENCE_ASSIGNMENT);
  add(Conditional, Right, PRECEDENCE_CONDITIONAL);
  add(NullishCoalescing, Left, 4);
  add(LogicalOr, Left, 4);
  add(LogicalAnd, Left, 5);
  add(Equality, Left, 9);
  add(Inequality, Left, 9);
  add(StrictEquality, Left, 9);
  add(StrictInequality, Left, 9);
  add(GreaterThan, Left, 10);
  add(GreaterThanOrEqual, Left, 10);
  add(LessThan, Left, 10);
  add(LessThanOrEqual, Left, 10);
  add(Addition, Left, 12);
  add(Subtraction, Left, 12);
  add(Division, Left, 13);
  add(Multiplication, Left, 13);
  add(Remainder, Left, 13);
  add(LogicalNot, Right, 15);
  add(Typeof, Right, 15);
  add(UnaryNegation, Right, 15);
  add(UnaryPlus, Right, 15);
  add(Void, Right, 15);
  map
});

#[rustfmt::skip]
pub static BINARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static Operator>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static Operator>::new();
  map.insert(TT::AmpersandAmpersand, &OPERATORS[&OperatorName::LogicalAnd]);
  map.insert(TT::Asterisk, &OPERATORS[&OperatorName::Multiplication]);
  map.insert(TT::AsteriskEquals, &OPERATORS[&OperatorName::AssignmentMultiplication]);
  map.insert(TT::BarBar, &OPERATORS[&OperatorName::LogicalOr]);
  map.insert(TT::ChevronLeft, &OPERATORS[&OperatorName::LessThan]);
  map.insert(TT::ChevronLeftEquals, &OPERATORS[&OperatorName::LessThanOrEqual]);
  map.insert(TT::ChevronRight, &OPERATORS[&OperatorName::GreaterThan]);
  map.insert(TT::ChevronRightEquals, &OPERATORS[&OperatorName::GreaterThanOrEqual]);
  map.insert(TT::Equals, &OPERATORS[&OperatorName::Assignment]);
  map.insert(TT::EqualsEquals, &OPERATORS[&OperatorName::Equality]);
  map.insert(TT::EqualsEqualsEquals, &OPERATORS[&OperatorName::StrictEquality]);
  map.insert(TT::ExclamationEquals, &OPERATORS[&OperatorName::Inequality]);
  map.insert(TT::ExclamationEqualsEquals, &OPERATORS[&OperatorName::StrictInequality]);
  map.insert(TT::Hyphen, &OPERATORS[&OperatorName::Subtraction]);
  map.insert(TT::HyphenEquals, &OPERATORS[&OperatorName::AssignmentSubtraction]);
  map.insert(TT::Percent, &OPERATORS[&OperatorName::Remainder]);
  map.insert(TT::Plus, &OPERATORS[&OperatorName::Addition]);
  map.insert(TT::PlusEquals, &OPERATORS[&OperatorName::AssignmentAddition]);
  map.insert(TT::QuestionQuestion, &OPERATORS[&OperatorName::NullishCoalescing]);
  map.insert(TT::Slash, &OPERATORS[&OperatorName::Division]);
  map
});

#[rustfmt::skip]
pub static UNARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static Operator>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static Operator>::new();
  map.insert(TT::Exclamation, &OPERATORS[&OperatorName::LogicalNot]);
  map.insert(TT::Hyphen, &OPERATORS[&OperatorName::UnaryNegation]);
  map.insert(TT::KeywordTypeof, &OPERATORS[&OperatorName::Typeof]);
  map.insert(TT::KeywordVoid, &OPERATORS[&OperatorName::Void]);
  map.insert(TT::Plus, &OPERATORS[&OperatorName::UnaryPlus]);
  map
});
