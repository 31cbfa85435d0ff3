//! Type conversion and comparison operations.

use crate::{GcString, Heap, Value, VmError};
use script_js::num::number_to_key;

pub fn to_boolean(heap: &Heap, value: Value) -> Result<bool, VmError> {
  Ok(match value {
    Value::Undefined | Value::Null => false,
    Value::Bool(b) => b,
    Value::Number(n) => n != 0.0 && !n.is_nan(),
    Value::String(s) => !heap.get_string(s)?.is_empty(),
    Value::Object(_) => true,
  })
}

pub fn to_number(heap: &Heap, value: Value) -> Result<f64, VmError> {
  Ok(match value {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(b) => {
      if b {
        1.0
      } else {
        0.0
      }
    }
    Value::Number(n) => n,
    Value::String(s) => string_to_number(heap.get_string(s)?.as_str()),
    Value::Object(_) => f64::NAN,
  })
}

fn string_to_number(s: &str) -> f64 {
  let trimmed = s.trim();
  if trimmed.is_empty() {
    return 0.0;
  }
  match trimmed {
    "Infinity" | "+Infinity" => return f64::INFINITY,
    "-Infinity" => return f64::NEG_INFINITY,
    _ => {}
  }
  if let Some(hex) = trimmed
    .strip_prefix("0x")
    .or_else(|| trimmed.strip_prefix("0X"))
  {
    return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
  }
  // Rust accepts spellings such as "inf" and "nan" that JS does not.
  if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
    return f64::NAN;
  }
  trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Number::toString(x)` for radix 10.
pub fn number_to_string(n: f64) -> String {
  if n.is_nan() {
    return "NaN".to_string();
  }
  if n == 0.0 {
    return "0".to_string();
  }
  if n.is_infinite() {
    return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
  }
  number_to_key(n)
}

/// `ToString(value)` as a script string. Objects render as `[object Object]`, error-like objects
/// as `name: message`, and functions as a placeholder source text.
pub fn to_string(heap: &mut Heap, value: Value) -> Result<GcString, VmError> {
  let text = match value {
    Value::String(s) => return Ok(s),
    Value::Undefined => "undefined".to_string(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => number_to_string(n),
    Value::Object(obj) => {
      if heap.is_callable(value) {
        "function () { [native code] }".to_string()
      } else if heap.error_kind(obj)?.is_some() {
        let name = match heap.get(obj, "name")? {
          Value::String(s) => heap.get_string(s)?.as_str().to_string(),
          _ => "Error".to_string(),
        };
        match heap.error_message(obj)? {
          Some(message) if !message.is_empty() => format!("{name}: {message}"),
          _ => name,
        }
      } else {
        "[object Object]".to_string()
      }
    }
  };
  heap.alloc_string(&text)
}

/// `ToString(value)` as a Rust string.
pub fn to_rust_string(heap: &mut Heap, value: Value) -> Result<String, VmError> {
  let s = to_string(heap, value)?;
  Ok(heap.get_string(s)?.as_str().to_string())
}

/// The result of the `typeof` operator.
pub fn type_of(heap: &Heap, value: Value) -> &'static str {
  match value {
    Value::Undefined => "undefined",
    Value::Null => "object",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Object(_) if heap.is_callable(value) => "function",
    Value::Object(_) => "object",
  }
}

/// `IsStrictlyEqual(a, b)`.
pub fn strict_equal(heap: &Heap, a: Value, b: Value) -> Result<bool, VmError> {
  Ok(match (a, b) {
    (Value::Undefined, Value::Undefined) => true,
    (Value::Null, Value::Null) => true,
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Number(x), Value::Number(y)) => x == y,
    (Value::String(x), Value::String(y)) => heap.get_string(x)? == heap.get_string(y)?,
    (Value::Object(x), Value::Object(y)) => x == y,
    _ => false,
  })
}

/// `IsLooselyEqual(a, b)` for the primitive types this runtime has.
pub fn loose_equal(heap: &Heap, a: Value, b: Value) -> Result<bool, VmError> {
  Ok(match (a, b) {
    (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
    (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
    (Value::Object(x), Value::Object(y)) => x == y,
    (Value::Object(_), _) | (_, Value::Object(_)) => false,
    (Value::String(_), Value::String(_)) => strict_equal(heap, a, b)?,
    _ => to_number(heap, a)? == to_number(heap, b)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::HeapLimits;

  #[test]
  fn numbers_format_like_javascript() {
    assert_eq!(number_to_string(2.0), "2");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(0.5), "0.5");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
  }

  #[test]
  fn strings_convert_to_numbers() {
    assert_eq!(string_to_number(" 42 "), 42.0);
    assert_eq!(string_to_number(""), 0.0);
    assert_eq!(string_to_number("0x10"), 16.0);
    assert_eq!(string_to_number("1e3"), 1000.0);
    assert!(string_to_number("inf").is_nan());
    assert!(string_to_number("12px").is_nan());
  }

  #[test]
  fn loose_equality_coerces_primitives() {
    let mut heap = Heap::new(HeapLimits::default());
    let one = Value::String(heap.alloc_string("1").unwrap());
    assert!(loose_equal(&heap, one, Value::Number(1.0)).unwrap());
    assert!(!strict_equal(&heap, one, Value::Number(1.0)).unwrap());
    assert!(loose_equal(&heap, Value::Null, Value::Undefined).unwrap());
    assert!(!loose_equal(&heap, Value::Null, Value::Number(0.0)).unwrap());
    assert!(loose_equal(&heap, Value::Bool(true), Value::Number(1.0)).unwrap());
  }
}
