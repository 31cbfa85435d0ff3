use crate::{GcObject, GcString, Heap};

/// A JavaScript value.
///
/// Heap-allocated values are represented using GC-managed handles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(GcString),
  Object(GcObject),
}

impl Value {
  pub fn is_object(self) -> bool {
    matches!(self, Value::Object(_))
  }

  pub fn as_object(self) -> Option<GcObject> {
    match self {
      Value::Object(obj) => Some(obj),
      _ => None,
    }
  }

  /// Values that may cross a realm boundary without wrapping.
  pub fn is_primitive(self) -> bool {
    !self.is_object()
  }

  /// ECMAScript `SameValue(x, y)`.
  pub fn same_value(self, other: Self, heap: &Heap) -> bool {
    match (self, other) {
      (Value::Number(a), Value::Number(b)) => {
        if a.is_nan() && b.is_nan() {
          return true;
        }
        a.to_bits() == b.to_bits() || (a == b && a != 0.0)
      }
      (Value::String(a), Value::String(b)) => match (heap.get_string(a), heap.get_string(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
      },
      (a, b) => a == b,
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Number(value)
  }
}

impl From<GcObject> for Value {
  fn from(obj: GcObject) -> Self {
    Value::Object(obj)
  }
}

impl From<GcString> for Value {
  fn from(s: GcString) -> Self {
    Value::String(s)
  }
}
