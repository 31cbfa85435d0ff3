use crate::heap::{Trace, Tracer};
use crate::Value;

/// A data property descriptor. Accessor properties are not modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyDescriptor {
  pub value: Value,
  pub writable: bool,
  pub enumerable: bool,
  pub configurable: bool,
}

impl PropertyDescriptor {
  /// A writable, enumerable, configurable property, as created by assignment.
  pub fn data(value: Value) -> Self {
    Self {
      value,
      writable: true,
      enumerable: true,
      configurable: true,
    }
  }

  /// A writable, non-enumerable, configurable property, as used for builtin methods.
  pub fn hidden(value: Value) -> Self {
    Self {
      value,
      writable: true,
      enumerable: false,
      configurable: true,
    }
  }

  /// A non-writable, non-enumerable, configurable property (function `name`/`length`).
  pub fn readonly(value: Value) -> Self {
    Self {
      value,
      writable: false,
      enumerable: false,
      configurable: true,
    }
  }

  /// A fully locked property (`undefined`, `NaN`, namespace exports).
  pub fn frozen(value: Value, enumerable: bool) -> Self {
    Self {
      value,
      writable: false,
      enumerable,
      configurable: false,
    }
  }
}

impl Trace for PropertyDescriptor {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    tracer.trace_value(self.value);
  }
}
