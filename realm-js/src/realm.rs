use crate::error_object::NativeErrorKind;
use crate::function::NativeCall;
use crate::heap::{HeapObject, Trace, Tracer};
use crate::ops::to_string;
use crate::promise::promise_prototype_then;
use crate::property::PropertyDescriptor;
use crate::shadow_realm::{shadow_realm_constructor, shadow_realm_evaluate, shadow_realm_import_value};
use crate::{GcEnv, GcObject, Heap, Intrinsics, JsRuntime, RealmId, Value, VmError};

/// A realm: global object, global environment and intrinsics. The unit of isolation.
#[derive(Debug)]
pub(crate) struct RealmRecord {
  pub(crate) global_object: GcObject,
  pub(crate) global_env: GcEnv,
  pub(crate) intrinsics: Intrinsics,
}

impl Trace for RealmRecord {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    tracer.trace_object(self.global_object);
    tracer.trace_env(self.global_env);
    self.intrinsics.trace(tracer);
  }
}

impl Heap {
  pub fn realm_global_object(&self, realm: RealmId) -> Result<GcObject, VmError> {
    Ok(self.get_realm(realm)?.global_object)
  }

  pub fn realm_global_env(&self, realm: RealmId) -> Result<GcEnv, VmError> {
    Ok(self.get_realm(realm)?.global_env)
  }

  pub fn realm_intrinsics(&self, realm: RealmId) -> Result<Intrinsics, VmError> {
    Ok(self.get_realm(realm)?.intrinsics)
  }
}

impl JsRuntime {
  /// Creates a fully initialized realm.
  ///
  /// The returned id is the only handle to the realm: on failure, everything allocated so far is
  /// unreachable and left for the collector.
  pub fn create_realm(&mut self) -> Result<RealmId, VmError> {
    let heap = &mut self.heap;
    let intrinsics = Intrinsics::alloc(heap)?;
    let global_object = heap.alloc_object(Some(intrinsics.object_prototype))?;
    let global_env = heap.env_create_global(global_object)?;
    let realm = RealmId(heap.alloc(HeapObject::Realm(RealmRecord {
      global_object,
      global_env,
      intrinsics,
    }))?);
    install_globals(heap, realm)?;
    tracing::debug!(target: "realm_js::vm", ?realm, "realm created");
    Ok(realm)
  }
}

fn install_globals(heap: &mut Heap, realm: RealmId) -> Result<(), VmError> {
  let intrinsics = heap.realm_intrinsics(realm)?;
  let global = heap.realm_global_object(realm)?;

  heap.define_own_property_or_throw(
    global,
    "globalThis",
    PropertyDescriptor::hidden(Value::Object(global)),
  )?;
  for (name, value) in [
    ("undefined", Value::Undefined),
    ("NaN", Value::Number(f64::NAN)),
    ("Infinity", Value::Number(f64::INFINITY)),
  ] {
    heap.define_own_property_or_throw(global, name, PropertyDescriptor::frozen(value, false))?;
  }

  for kind in NativeErrorKind::ALL {
    let ctor = heap.alloc_native_function(realm, kind.name(), 1, true, move |rt, call| {
      error_constructor(rt, call, kind)
    })?;
    link_constructor(heap, ctor, intrinsics.error_prototype(kind))?;
    heap.define_own_property_or_throw(global, kind.name(), PropertyDescriptor::hidden(Value::Object(ctor)))?;
  }

  let then = heap.alloc_native_function(realm, "then", 2, false, promise_prototype_then)?;
  heap.define_own_property_or_throw(
    intrinsics.promise_prototype,
    "then",
    PropertyDescriptor::hidden(Value::Object(then)),
  )?;

  let shadow_realm = heap.alloc_native_function(realm, "ShadowRealm", 0, true, shadow_realm_constructor)?;
  link_constructor(heap, shadow_realm, intrinsics.shadow_realm_prototype)?;
  heap.define_own_property_or_throw(
    global,
    "ShadowRealm",
    PropertyDescriptor::hidden(Value::Object(shadow_realm)),
  )?;
  let evaluate = heap.alloc_native_function(realm, "evaluate", 1, false, shadow_realm_evaluate)?;
  heap.define_own_property_or_throw(
    intrinsics.shadow_realm_prototype,
    "evaluate",
    PropertyDescriptor::hidden(Value::Object(evaluate)),
  )?;
  let import_value =
    heap.alloc_native_function(realm, "importValue", 2, false, shadow_realm_import_value)?;
  heap.define_own_property_or_throw(
    intrinsics.shadow_realm_prototype,
    "importValue",
    PropertyDescriptor::hidden(Value::Object(import_value)),
  )?;
  Ok(())
}

fn link_constructor(heap: &mut Heap, ctor: GcObject, prototype: GcObject) -> Result<(), VmError> {
  heap.define_own_property_or_throw(
    ctor,
    "prototype",
    PropertyDescriptor::frozen(Value::Object(prototype), false),
  )?;
  heap.define_own_property_or_throw(
    prototype,
    "constructor",
    PropertyDescriptor::hidden(Value::Object(ctor)),
  )
}

/// `Error(message)` and the native error constructors; callable with or without `new`.
fn error_constructor(
  rt: &mut JsRuntime,
  call: &NativeCall,
  kind: NativeErrorKind,
) -> Result<Value, VmError> {
  let realm = rt.heap.function_realm(call.callee)?;
  let message = match call.arg(0) {
    Value::Undefined => String::new(),
    value => {
      let s = to_string(&mut rt.heap, value)?;
      rt.heap.get_string(s)?.as_str().to_string()
    }
  };
  let err = rt.create_error(realm, kind, &message)?;
  Ok(Value::Object(err))
}
