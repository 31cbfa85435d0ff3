//! Cross-realm evaluation, wrapped callables and the dynamic import bridge, plus the
//! `ShadowRealm` constructor and prototype methods built on them.
//!
//! Nothing but primitives and callables ever crosses a realm boundary: callables are replaced by
//! wrappers living in the receiving realm, plain objects are refused, and failures in the other
//! realm surface as errors of the caller's realm.
//!
//! - ShadowRealm proposal: <https://tc39.es/proposal-shadowrealm/>

use crate::completion::Completion;
use crate::declarations::eval_declaration_instantiation;
use crate::exec::Evaluator;
use crate::execution_context::ExecutionContext;
use crate::function::NativeCall;
use crate::heap::ObjectClass;
use crate::ops::to_rust_string;
use crate::promise::ReactionHandler;
use crate::property::PropertyDescriptor;
use crate::static_semantics::early_errors;
use crate::{GcObject, Heap, JsRuntime, NativeErrorKind, RealmId, Value, VmError};
use script_js::ast::node::Node;
use script_js::ast::stmt::Stmt;

impl JsRuntime {
  /// Evaluates `source` as a script in `target_realm` on behalf of `caller_realm`
  /// (`PerformShadowRealmEval`).
  ///
  /// Parse errors and restricted syntax (`new.target`, `super`) fail with [`VmError::Syntax`]
  /// before any context is pushed, and an empty script yields `undefined` without running
  /// anything. Otherwise the script runs in a fresh declarative environment over the target's
  /// global environment; non-strict `var` and function declarations land on the target's global
  /// object. A script that does not complete normally fails with the opaque
  /// [`VmError::EvaluationFailed`]; a completion value is passed through [`JsRuntime::wrap`].
  pub fn evaluate(
    &mut self,
    source: &str,
    caller_realm: RealmId,
    target_realm: RealmId,
  ) -> Result<Value, VmError> {
    let span = tracing::debug_span!(
      target: "realm_js::shadow_realm",
      "evaluate",
      ?caller_realm,
      ?target_realm
    );
    let _enter = span.enter();

    let top = script_js::parse(source).map_err(|err| VmError::Syntax(vec![err]))?;
    if top.stx.body.is_empty() {
      return Ok(Value::Undefined);
    }
    let errors = early_errors(&top.stx.body);
    if !errors.is_empty() {
      return Err(VmError::Syntax(errors));
    }

    let strict = top.stx.strict;
    let global_env = self.heap.realm_global_env(target_realm)?;
    let lexical_environment = self.heap.env_create(Some(global_env))?;
    let ctx = ExecutionContext {
      realm: target_realm,
      function: None,
      variable_environment: if strict { lexical_environment } else { global_env },
      lexical_environment,
      strict,
    };

    let mut guard = self.enter_execution_context(ctx)?;
    let result = run_eval_body(&mut guard, ctx, &top.stx.body);
    guard.exit()?;

    match result {
      Ok(value) => self.wrap(value, caller_realm),
      Err(err) if err.is_fatal() => Err(err),
      Err(err) => {
        tracing::debug!(target: "realm_js::shadow_realm", %err, "evaluation did not complete normally");
        Err(VmError::EvaluationFailed)
      }
    }
  }

  /// `GetWrappedValue(callerRealm, value)`.
  ///
  /// Primitives pass through unchanged, callables get a fresh wrapper resident in `caller_realm`,
  /// and any other object fails with [`VmError::NonFunctionObjectNotTransferable`]. Wrappers are
  /// not deduplicated: wrapping the same callable twice yields two distinct wrappers.
  pub fn wrap(&mut self, value: Value, caller_realm: RealmId) -> Result<Value, VmError> {
    let Value::Object(target) = value else {
      return Ok(value);
    };
    if !self.heap.is_callable(value) {
      return Err(VmError::NonFunctionObjectNotTransferable);
    }

    let origin_realm = self.heap.function_realm(target)?;
    let wrapper = self
      .heap
      .alloc_wrapped_function(caller_realm, target, origin_realm)?;
    copy_name_and_length(&mut self.heap, wrapper, target)?;
    self.heap.register_edge(wrapper, origin_realm)?;
    tracing::trace!(
      target: "realm_js::shadow_realm",
      ?wrapper,
      ?target,
      ?origin_realm,
      ?caller_realm,
      "wrapped callable created"
    );
    Ok(Value::Object(wrapper))
  }

  /// `ShadowRealmImportValue`: returns a promise of `caller_realm` that settles with the wrapped
  /// `export_name` export of the module `specifier`, loaded from within `target_context`.
  ///
  /// The promise never settles before the next microtask checkpoint.
  pub fn import_value(
    &mut self,
    specifier: &str,
    export_name: &str,
    caller_realm: RealmId,
    target_context: ExecutionContext,
  ) -> Result<GcObject, VmError> {
    let span = tracing::debug_span!(
      target: "realm_js::shadow_realm",
      "import_value",
      specifier,
      export_name,
      ?caller_realm
    );
    let _enter = span.enter();

    let outer = self.new_promise_capability(caller_realm)?;
    let inner = self.new_promise_capability(caller_realm)?;

    let mut guard = self.enter_execution_context(target_context)?;
    let started = guard.host_import_module_dynamically(specifier, inner.clone());
    guard.exit()?;
    started?;

    let promise = outer.promise;
    self.perform_promise_then_with(
      inner.promise,
      ReactionHandler::ExportGetter {
        export_name: export_name.into(),
        realm: caller_realm,
      },
      ReactionHandler::ImportRejection {
        realm: caller_realm,
      },
      Some(outer),
    )?;
    Ok(promise)
  }

  /// Creates a new realm and a `ShadowRealm` object for it, owned by `caller_realm`.
  pub fn create_shadow_realm(&mut self, caller_realm: RealmId) -> Result<GcObject, VmError> {
    let realm = self.create_realm()?;
    let context = ExecutionContext::for_realm(&self.heap, realm)?;
    let prototype = self.heap.realm_intrinsics(caller_realm)?.shadow_realm_prototype;
    let obj = self
      .heap
      .alloc_object_with_class(Some(prototype), ObjectClass::ShadowRealm { realm, context })?;
    self.heap.register_edge(obj, realm)?;
    tracing::debug!(target: "realm_js::shadow_realm", ?caller_realm, ?realm, "shadow realm created");
    Ok(obj)
  }
}

fn run_eval_body(rt: &mut JsRuntime, ctx: ExecutionContext, body: &[Node<Stmt>]) -> Result<Value, VmError> {
  eval_declaration_instantiation(
    &mut rt.heap,
    ctx.realm,
    body,
    ctx.variable_environment,
    ctx.lexical_environment,
    ctx.strict,
  )?;
  match Evaluator::new(rt, ctx).eval_stmt_list(body)? {
    Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
    Completion::Throw(value) => Err(VmError::Throw(value)),
    Completion::Return(_) | Completion::Break(..) | Completion::Continue(..) => Err(
      VmError::InternalInvariantViolation("non-local jump escaped a script"),
    ),
  }
}

/// `CopyNameAndLength(F, Target)`.
fn copy_name_and_length(heap: &mut Heap, wrapper: GcObject, target: GcObject) -> Result<(), VmError> {
  let mut length = 0.0;
  if heap.has_own_property(target, "length")? {
    if let Value::Number(target_length) = heap.get(target, "length")? {
      length = if target_length == f64::INFINITY {
        f64::INFINITY
      } else if target_length.is_nan() {
        0.0
      } else {
        target_length.trunc().max(0.0)
      };
    }
  }
  heap.define_own_property_or_throw(
    wrapper,
    "length",
    PropertyDescriptor::readonly(Value::Number(length)),
  )?;

  let name = match heap.get(target, "name")? {
    Value::String(name) => name,
    _ => heap.alloc_string("")?,
  };
  heap.define_own_property_or_throw(wrapper, "name", PropertyDescriptor::readonly(Value::String(name)))
}

/// `[[Call]]` of a wrapper: marshals `this` and the arguments into the origin realm, calls the
/// target with an origin-realm context pushed, and marshals the outcome back.
///
/// A thrown primitive or callable is re-thrown wrapped; any other thrown value is replaced by a
/// `TypeError` so the caller never sees an origin-realm object.
pub(crate) fn call_wrapped(
  rt: &mut JsRuntime,
  wrapper: GcObject,
  target: GcObject,
  origin_realm: RealmId,
  this: Value,
  args: &[Value],
) -> Result<Value, VmError> {
  let caller_realm = rt.heap.function_realm(wrapper)?;
  let wrapped_this = rt.wrap(this, origin_realm)?;
  let wrapped_args = args
    .iter()
    .map(|arg| rt.wrap(*arg, origin_realm))
    .collect::<Result<Vec<_>, _>>()?;

  let global_env = rt.heap.realm_global_env(origin_realm)?;
  let ctx = ExecutionContext {
    realm: origin_realm,
    function: Some(wrapper),
    variable_environment: global_env,
    lexical_environment: global_env,
    strict: true,
  };
  let mut guard = rt.enter_execution_context(ctx)?;
  let result = guard.call(Value::Object(target), wrapped_this, &wrapped_args);
  guard.exit()?;

  match result {
    Ok(value) => rt.wrap(value, caller_realm),
    Err(VmError::Throw(thrown)) if !thrown.is_object() || rt.heap.is_callable(thrown) => {
      Err(VmError::Throw(rt.wrap(thrown, caller_realm)?))
    }
    Err(err) if err.is_fatal() => Err(err),
    Err(err) => {
      tracing::debug!(target: "realm_js::shadow_realm", %err, "wrapped callable threw");
      Err(VmError::TypeError("Wrapped function threw an error".to_string()))
    }
  }
}

/// Fulfillment step of the import bridge: reads the export and wraps it into `realm`.
pub(crate) fn export_getter(
  rt: &mut JsRuntime,
  namespace: Value,
  export_name: &str,
  realm: RealmId,
) -> Result<Value, VmError> {
  let Value::Object(namespace) = namespace else {
    return Err(VmError::TypeError(
      "dynamic import did not produce a module namespace".to_string(),
    ));
  };
  if !rt.heap.has_own_property(namespace, export_name)? {
    return Err(VmError::MissingExport(export_name.to_string()));
  }
  let value = rt.heap.get(namespace, export_name)?;
  rt.wrap(value, realm)
}

/// Rejection step of the import bridge: a `TypeError` of `realm` carrying only the reason's
/// message.
pub(crate) fn import_rejection(rt: &mut JsRuntime, reason: Value, realm: RealmId) -> Result<Value, VmError> {
  let message = match reason {
    Value::Object(obj) => match rt.heap.get(obj, "message")? {
      Value::Undefined => String::new(),
      message => to_rust_string(&mut rt.heap, message)?,
    },
    primitive => to_rust_string(&mut rt.heap, primitive)?,
  };
  let err = rt.create_error(realm, NativeErrorKind::TypeError, &message)?;
  Err(VmError::Throw(Value::Object(err)))
}

fn shadow_realm_receiver(
  heap: &Heap,
  this: Value,
  method: &str,
) -> Result<(RealmId, ExecutionContext), VmError> {
  let record = match this {
    Value::Object(obj) => heap.shadow_realm_record(obj)?,
    _ => None,
  };
  record.ok_or_else(|| {
    VmError::TypeError(format!(
      "ShadowRealm.prototype.{method} called on an incompatible receiver"
    ))
  })
}

/// `new ShadowRealm()`.
pub(crate) fn shadow_realm_constructor(rt: &mut JsRuntime, call: &NativeCall) -> Result<Value, VmError> {
  if !call.is_construct() {
    return Err(VmError::TypeError(
      "Constructor ShadowRealm requires 'new'".to_string(),
    ));
  }
  let caller_realm = rt.heap.function_realm(call.callee)?;
  Ok(Value::Object(rt.create_shadow_realm(caller_realm)?))
}

/// `ShadowRealm.prototype.evaluate(sourceText)`.
pub(crate) fn shadow_realm_evaluate(rt: &mut JsRuntime, call: &NativeCall) -> Result<Value, VmError> {
  let (target_realm, _) = shadow_realm_receiver(&rt.heap, call.this, "evaluate")?;
  let Value::String(source) = call.arg(0) else {
    return Err(VmError::TypeError(
      "ShadowRealm.prototype.evaluate expects a string".to_string(),
    ));
  };
  let source = rt.heap.get_string(source)?.as_str().to_string();
  let caller_realm = rt.heap.function_realm(call.callee)?;
  rt.evaluate(&source, caller_realm, target_realm)
}

/// `ShadowRealm.prototype.importValue(specifier, exportName)`.
pub(crate) fn shadow_realm_import_value(
  rt: &mut JsRuntime,
  call: &NativeCall,
) -> Result<Value, VmError> {
  let (_, context) = shadow_realm_receiver(&rt.heap, call.this, "importValue")?;
  let specifier = to_rust_string(&mut rt.heap, call.arg(0))?;
  let Value::String(export_name) = call.arg(1) else {
    return Err(VmError::TypeError(
      "ShadowRealm.prototype.importValue expects a string export name".to_string(),
    ));
  };
  let export_name = rt.heap.get_string(export_name)?.as_str().to_string();
  let caller_realm = rt.heap.function_realm(call.callee)?;
  let promise = rt.import_value(&specifier, &export_name, caller_realm, context)?;
  Ok(Value::Object(promise))
}
