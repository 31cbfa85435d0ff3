use crate::heap::{HeapObject, ObjectBase, Trace, Tracer};
use crate::property::PropertyDescriptor;
use crate::{GcEnv, GcObject, Heap, JsRuntime, RealmId, Value, VmError};
use core::fmt;
use script_js::ast::func::Func;
use std::rc::Rc;

/// A host-implemented `[[Call]]` (and, for constructors, `[[Construct]]`) behaviour.
pub type NativeFunction = Rc<dyn Fn(&mut JsRuntime, &NativeCall) -> Result<Value, VmError>>;

/// Arguments of a native function invocation.
#[derive(Debug, Clone)]
pub struct NativeCall {
  /// The function object being invoked.
  pub callee: GcObject,
  pub this: Value,
  pub args: Vec<Value>,
  /// `undefined` for `[[Call]]`, the constructor for `[[Construct]]`.
  pub new_target: Value,
}

impl NativeCall {
  /// The `i`th argument, or `undefined`.
  pub fn arg(&self, i: usize) -> Value {
    self.args.get(i).copied().unwrap_or(Value::Undefined)
  }

  pub fn is_construct(&self) -> bool {
    !matches!(self.new_target, Value::Undefined)
  }
}

/// ECMAScript `[[ThisMode]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThisMode {
  /// Arrow functions.
  Lexical,
  /// Strict-mode functions.
  Strict,
  /// Sloppy-mode functions.
  Global,
}

#[derive(Clone)]
pub(crate) enum FunctionKind {
  Native(NativeFunction),
  Ecma {
    code: Rc<Func>,
    env: GcEnv,
    this_mode: ThisMode,
    strict: bool,
  },
  /// A callable resident in one realm that forwards to a target owned by `origin_realm`.
  Wrapped {
    target: GcObject,
    origin_realm: RealmId,
  },
}

impl fmt::Debug for FunctionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FunctionKind::Native(_) => f.write_str("Native"),
      FunctionKind::Ecma {
        code,
        this_mode,
        strict,
        ..
      } => f
        .debug_struct("Ecma")
        .field("name", &code.name)
        .field("this_mode", this_mode)
        .field("strict", strict)
        .finish(),
      FunctionKind::Wrapped {
        target,
        origin_realm,
      } => f
        .debug_struct("Wrapped")
        .field("target", target)
        .field("origin_realm", origin_realm)
        .finish(),
    }
  }
}

/// A JavaScript function object.
#[derive(Debug)]
pub(crate) struct JsFunction {
  pub(crate) base: ObjectBase,
  /// `[[Realm]]`: where the function was created.
  pub(crate) realm: RealmId,
  pub(crate) constructable: bool,
  pub(crate) kind: FunctionKind,
}

impl Trace for JsFunction {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    self.base.trace(tracer);
    tracer.trace_realm(self.realm);
    match &self.kind {
      FunctionKind::Native(_) => {}
      FunctionKind::Ecma { env, .. } => tracer.trace_env(*env),
      // The origin realm is reached through the edge registered by `JsRuntime::wrap`.
      FunctionKind::Wrapped { target, .. } => tracer.trace_object(*target),
    }
  }
}

impl Heap {
  /// Allocates a host function in `realm`, with `name` and `length` own properties.
  pub fn alloc_native_function(
    &mut self,
    realm: RealmId,
    name: &str,
    length: u32,
    constructable: bool,
    f: impl Fn(&mut JsRuntime, &NativeCall) -> Result<Value, VmError> + 'static,
  ) -> Result<GcObject, VmError> {
    let func = self.alloc_function(realm, constructable, FunctionKind::Native(Rc::new(f)))?;
    self.set_function_name_and_length(func, name, length)?;
    Ok(func)
  }

  /// Instantiates a closure over `env`. Ordinary functions also get a `prototype` object.
  pub(crate) fn alloc_ecma_function(
    &mut self,
    realm: RealmId,
    code: &Func,
    env: GcEnv,
  ) -> Result<GcObject, VmError> {
    let this_mode = if code.arrow {
      ThisMode::Lexical
    } else if code.strict {
      ThisMode::Strict
    } else {
      ThisMode::Global
    };
    let kind = FunctionKind::Ecma {
      code: Rc::new(code.clone()),
      env,
      this_mode,
      strict: code.strict,
    };
    let constructable = !code.arrow;
    let func = self.alloc_function(realm, constructable, kind)?;
    self.set_function_name_and_length(func, code.name.as_deref().unwrap_or(""), code.length())?;

    if constructable {
      let object_prototype = self.realm_intrinsics(realm)?.object_prototype;
      let prototype = self.alloc_object(Some(object_prototype))?;
      self.define_own_property(
        prototype,
        "constructor",
        PropertyDescriptor::hidden(Value::Object(func)),
      )?;
      self.define_own_property(func, "prototype", PropertyDescriptor {
        value: Value::Object(prototype),
        writable: true,
        enumerable: false,
        configurable: false,
      })?;
    }
    Ok(func)
  }

  /// Allocates the wrapper half of `WrappedFunctionCreate`; name and length are copied by the
  /// caller.
  pub(crate) fn alloc_wrapped_function(
    &mut self,
    caller_realm: RealmId,
    target: GcObject,
    origin_realm: RealmId,
  ) -> Result<GcObject, VmError> {
    self.alloc_function(caller_realm, false, FunctionKind::Wrapped {
      target,
      origin_realm,
    })
  }

  fn alloc_function(
    &mut self,
    realm: RealmId,
    constructable: bool,
    kind: FunctionKind,
  ) -> Result<GcObject, VmError> {
    let prototype = self.realm_intrinsics(realm)?.function_prototype;
    let func = JsFunction {
      base: ObjectBase::new(Some(prototype)),
      realm,
      constructable,
      kind,
    };
    Ok(GcObject(self.alloc(HeapObject::Function(func))?))
  }

  /// `SetFunctionName` + `SetFunctionLength`.
  pub(crate) fn set_function_name_and_length(
    &mut self,
    func: GcObject,
    name: &str,
    length: u32,
  ) -> Result<(), VmError> {
    self.define_own_property_or_throw(
      func,
      "length",
      PropertyDescriptor::readonly(Value::Number(length as f64)),
    )?;
    let name = self.alloc_string(name)?;
    self.define_own_property_or_throw(func, "name", PropertyDescriptor::readonly(Value::String(name)))
  }

  /// `[[Realm]]` of a function object.
  pub fn function_realm(&self, func: GcObject) -> Result<RealmId, VmError> {
    Ok(self.get_function(func)?.realm)
  }

  /// Whether `func` is a wrapper created by [`JsRuntime::wrap`].
  pub fn is_wrapped_function(&self, func: GcObject) -> bool {
    matches!(
      self.get_function(func).map(|f| &f.kind),
      Ok(FunctionKind::Wrapped { .. })
    )
  }

  /// The target and origin realm of a wrapper.
  pub fn wrapped_function_target(
    &self,
    func: GcObject,
  ) -> Result<Option<(GcObject, RealmId)>, VmError> {
    Ok(match self.get_function(func)?.kind {
      FunctionKind::Wrapped {
        target,
        origin_realm,
      } => Some((target, origin_realm)),
      _ => None,
    })
  }

  pub(crate) fn function_kind(&self, func: GcObject) -> Result<FunctionKind, VmError> {
    Ok(self.get_function(func)?.kind.clone())
  }
}
