//! Execution contexts.
//!
//! A context records which realm is active, which function (if any) is running, the environment
//! chain used for name resolution, and strictness. Contexts live on the [`crate::Vm`] stack; the
//! top of the stack is the running execution context.

use crate::heap::{Trace, Tracer};
use crate::{GcEnv, GcObject, Heap, RealmId, VmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
  pub realm: RealmId,
  pub function: Option<GcObject>,
  pub variable_environment: GcEnv,
  pub lexical_environment: GcEnv,
  pub strict: bool,
}

impl ExecutionContext {
  /// A context running at the top level of `realm`, with both environments set to its global
  /// environment.
  pub fn for_realm(heap: &Heap, realm: RealmId) -> Result<Self, VmError> {
    let global_env = heap.realm_global_env(realm)?;
    Ok(Self {
      realm,
      function: None,
      variable_environment: global_env,
      lexical_environment: global_env,
      strict: false,
    })
  }
}

impl Trace for ExecutionContext {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    tracer.trace_realm(self.realm);
    if let Some(function) = self.function {
      tracer.trace_object(function);
    }
    tracer.trace_env(self.variable_environment);
    tracer.trace_env(self.lexical_environment);
  }
}
