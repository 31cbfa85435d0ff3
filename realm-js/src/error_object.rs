use crate::heap::ObjectClass;
use crate::property::PropertyDescriptor;
use crate::{GcObject, Heap, JsRuntime, RealmId, Value, VmError};

/// The native error constructors every realm provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorKind {
  Error,
  TypeError,
  SyntaxError,
  ReferenceError,
  RangeError,
}

impl NativeErrorKind {
  pub const ALL: [NativeErrorKind; 5] = [
    NativeErrorKind::Error,
    NativeErrorKind::TypeError,
    NativeErrorKind::SyntaxError,
    NativeErrorKind::ReferenceError,
    NativeErrorKind::RangeError,
  ];

  pub fn name(self) -> &'static str {
    match self {
      NativeErrorKind::Error => "Error",
      NativeErrorKind::TypeError => "TypeError",
      NativeErrorKind::SyntaxError => "SyntaxError",
      NativeErrorKind::ReferenceError => "ReferenceError",
      NativeErrorKind::RangeError => "RangeError",
    }
  }
}

impl VmError {
  /// The kind of error object a catchable error materializes as.
  pub fn native_error_kind(&self) -> NativeErrorKind {
    match self {
      VmError::Syntax(_) | VmError::DeclarationConflict(_) => NativeErrorKind::SyntaxError,
      VmError::ReferenceError(_) => NativeErrorKind::ReferenceError,
      VmError::RangeError(_) => NativeErrorKind::RangeError,
      _ => NativeErrorKind::TypeError,
    }
  }

  /// The `message` of the materialized error object.
  pub fn script_message(&self) -> String {
    match self {
      VmError::Syntax(errors) => errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "invalid syntax".to_string()),
      VmError::TypeError(msg) | VmError::ReferenceError(msg) | VmError::RangeError(msg) => {
        msg.clone()
      }
      other => {
        let mut msg = other.to_string();
        if let Some(first) = msg.get(..1) {
          let upper = first.to_ascii_uppercase();
          msg.replace_range(..1, &upper);
        }
        msg
      }
    }
  }
}

impl Heap {
  /// Allocates an error instance of `kind` in `realm` with an own `message` property.
  pub fn alloc_error(
    &mut self,
    realm: RealmId,
    kind: NativeErrorKind,
    message: &str,
  ) -> Result<GcObject, VmError> {
    let prototype = self.realm_intrinsics(realm)?.error_prototype(kind);
    let err = self.alloc_object_with_class(Some(prototype), ObjectClass::Error(kind))?;
    let message = self.alloc_string(message)?;
    self.define_own_property(err, "message", PropertyDescriptor::hidden(Value::String(message)))?;
    Ok(err)
  }

  /// The `message` of an error-like object, without invoking any script.
  pub fn error_message(&self, obj: GcObject) -> Result<Option<String>, VmError> {
    Ok(match self.get(obj, "message")? {
      Value::String(s) => Some(self.get_string(s)?.as_str().to_string()),
      _ => None,
    })
  }
}

impl JsRuntime {
  /// Creates an error object of `kind` belonging to `realm`.
  pub fn create_error(
    &mut self,
    realm: RealmId,
    kind: NativeErrorKind,
    message: &str,
  ) -> Result<GcObject, VmError> {
    self.heap.alloc_error(realm, kind, message)
  }

  /// Materializes a catchable error as a script value of `realm`.
  ///
  /// Thrown values pass through; fatal errors are returned unchanged as `Err`.
  pub fn error_to_value(&mut self, err: VmError, realm: RealmId) -> Result<Value, VmError> {
    match err {
      VmError::Throw(value) => Ok(value),
      err if err.is_fatal() => Err(err),
      err => {
        let obj = self.create_error(realm, err.native_error_kind(), &err.script_message())?;
        Ok(Value::Object(obj))
      }
    }
  }
}
