use crate::value::Value;
use script_js::error::SyntaxError;

/// Errors produced by the runtime.
///
/// Variants fall into three groups:
/// - the cross-realm taxonomy (`Syntax` through `InternalInvariantViolation`),
/// - catchable evaluator errors, which are materialized as error objects of the running realm when
///   they reach script code (see [`crate::JsRuntime::error_to_value`]),
/// - fatal conditions, which propagate unchanged through every layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VmError {
  /// Parse or static-restriction failure. Raised before any execution context is pushed.
  #[error("syntax error: {}", format_syntax_errors(.0))]
  Syntax(Vec<SyntaxError>),

  /// Declaration instantiation found a binding that may not be (re)declared.
  #[error("identifier '{0}' has already been declared")]
  DeclarationConflict(String),

  /// Opaque failure of code evaluated in another realm.
  #[error("the evaluated script did not complete normally")]
  EvaluationFailed,

  /// A non-callable object was about to cross a realm boundary.
  #[error("wrapped value must be primitive or a function object")]
  NonFunctionObjectNotTransferable,

  /// A dynamically imported module namespace lacks the requested export.
  #[error("required property {0} is missing or undefined")]
  MissingExport(String),

  /// The execution context stack exceeded its configured depth.
  #[error("maximum call stack size exceeded")]
  StackOverflow,

  /// Execution context stack discipline was broken.
  #[error("internal invariant violation: {0}")]
  InternalInvariantViolation(&'static str),

  /// A JavaScript `throw` value. This is catchable from JS.
  #[error("uncaught exception")]
  Throw(Value),

  #[error("type error: {0}")]
  TypeError(String),

  #[error("reference error: {0}")]
  ReferenceError(String),

  #[error("range error: {0}")]
  RangeError(String),

  /// Attempted to call a non-callable value.
  #[error("value is not callable")]
  NotCallable,

  /// Attempted to construct a non-constructable value.
  #[error("value is not a constructor")]
  NotConstructable,

  /// A GC handle was used after the underlying allocation was freed.
  #[error("invalid handle")]
  InvalidHandle,

  /// The heap has exceeded its configured memory limit.
  #[error("out of memory")]
  OutOfMemory,
}

impl VmError {
  /// Whether script code may observe (and `catch`) this error.
  pub fn is_catchable(&self) -> bool {
    !self.is_fatal()
  }

  /// Fatal errors are never materialized as script values.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      VmError::StackOverflow
        | VmError::InternalInvariantViolation(_)
        | VmError::InvalidHandle
        | VmError::OutOfMemory
    )
  }
}

fn format_syntax_errors(errors: &[SyntaxError]) -> String {
  errors
    .iter()
    .map(|e| e.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}
