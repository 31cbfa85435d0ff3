use crate::Value;

/// A completion record: the outcome of evaluating a statement.
///
/// The "empty" completion value is `None`, so statement lists can implement `UpdateEmpty` (e.g.
/// `1; var x;` evaluates to `1`). Expressions evaluate to `Result<Value, VmError>` instead,
/// with a JS throw carried as [`crate::VmError::Throw`]; the two meet at `try` statements and
/// function boundaries.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
  Normal(Option<Value>),
  Throw(Value),
  Return(Value),
  Break(Option<String>, Option<Value>),
  Continue(Option<String>, Option<Value>),
}

impl Completion {
  pub fn empty() -> Self {
    Completion::Normal(None)
  }

  pub fn normal(value: Value) -> Self {
    Completion::Normal(Some(value))
  }

  pub fn value(&self) -> Option<Value> {
    match self {
      Completion::Normal(v) => *v,
      Completion::Throw(v) => Some(*v),
      Completion::Return(v) => Some(*v),
      Completion::Break(_, v) => *v,
      Completion::Continue(_, v) => *v,
    }
  }

  pub fn is_abrupt(&self) -> bool {
    !matches!(self, Completion::Normal(_))
  }

  /// `UpdateEmpty(completion, value)`.
  pub fn update_empty(self, value: Option<Value>) -> Self {
    match self {
      Completion::Normal(None) => Completion::Normal(value),
      Completion::Break(target, None) => Completion::Break(target, value),
      Completion::Continue(target, None) => Completion::Continue(target, value),
      other => other,
    }
  }

  /// `LoopContinues(completion, labelSet)`.
  pub fn loop_continues(&self, labels: &[String]) -> bool {
    match self {
      Completion::Normal(_) => true,
      Completion::Continue(None, _) => true,
      Completion::Continue(Some(label), _) => labels.contains(label),
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_empty_only_fills_missing_values() {
    let one = Value::Number(1.0);
    let two = Value::Number(2.0);
    assert_eq!(Completion::empty().update_empty(Some(one)), Completion::normal(one));
    assert_eq!(Completion::normal(two).update_empty(Some(one)), Completion::normal(two));
    assert_eq!(
      Completion::Break(Some("l".to_string()), None).update_empty(Some(one)),
      Completion::Break(Some("l".to_string()), Some(one))
    );
    assert_eq!(Completion::Return(two).update_empty(Some(one)), Completion::Return(two));
    assert_eq!(Completion::Throw(two).update_empty(None), Completion::Throw(two));
  }

  #[test]
  fn loop_continues_respects_labels() {
    let labels = vec!["outer".to_string()];
    assert!(Completion::empty().loop_continues(&labels));
    assert!(Completion::Continue(None, None).loop_continues(&labels));
    assert!(Completion::Continue(Some("outer".to_string()), None).loop_continues(&labels));
    assert!(!Completion::Continue(Some("other".to_string()), None).loop_continues(&labels));
    assert!(!Completion::Break(None, None).loop_continues(&labels));
    assert!(!Completion::Return(Value::Undefined).loop_continues(&[]));
  }
}
