//! Environment records and identifier resolution.
//!
//! Environments form a chain through `outer`. A global environment is split in two: its own
//! declarative bindings hold top-level `let`/`const`, and its global object holds `var` and
//! function declarations. Resolution checks the declarative part first.

use crate::heap::{HeapObject, Trace, Tracer};
use crate::property::PropertyDescriptor;
use crate::{GcEnv, GcObject, Heap, Value, VmError};
use core::mem;

#[derive(Debug)]
pub(crate) struct EnvRecord {
  pub(crate) outer: Option<GcEnv>,
  pub(crate) kind: EnvKind,
  pub(crate) bindings: Vec<EnvBinding>,
  /// Set on function and global environments.
  pub(crate) this_value: Option<Value>,
  pub(crate) new_target: Value,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum EnvKind {
  Declarative,
  Global { global_object: GcObject },
}

#[derive(Debug)]
pub(crate) struct EnvBinding {
  pub(crate) name: Box<str>,
  pub(crate) value: Value,
  pub(crate) mutable: bool,
  pub(crate) initialized: bool,
}

impl EnvRecord {
  fn new(outer: Option<GcEnv>, kind: EnvKind) -> Self {
    Self {
      outer,
      kind,
      bindings: Vec::new(),
      this_value: None,
      new_target: Value::Undefined,
    }
  }

  pub(crate) fn heap_size_bytes(&self) -> usize {
    self
      .bindings
      .iter()
      .map(|b| mem::size_of::<EnvBinding>().saturating_add(b.name.len()))
      .sum()
  }

  fn find(&self, name: &str) -> Option<&EnvBinding> {
    self.bindings.iter().find(|b| &*b.name == name)
  }

  fn find_mut(&mut self, name: &str) -> Option<&mut EnvBinding> {
    self.bindings.iter_mut().find(|b| &*b.name == name)
  }
}

impl Trace for EnvRecord {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Some(outer) = self.outer {
      tracer.trace_env(outer);
    }
    if let EnvKind::Global { global_object } = self.kind {
      tracer.trace_object(global_object);
    }
    for binding in &self.bindings {
      tracer.trace_value(binding.value);
    }
    if let Some(this) = self.this_value {
      tracer.trace_value(this);
    }
    tracer.trace_value(self.new_target);
  }
}

/// Where a name resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingRef {
  Declarative(GcEnv),
  GlobalObject(GcObject),
  Unresolvable,
}

impl Heap {
  /// `NewDeclarativeEnvironment(outer)`.
  pub fn env_create(&mut self, outer: Option<GcEnv>) -> Result<GcEnv, VmError> {
    let id = self.alloc(HeapObject::Env(EnvRecord::new(outer, EnvKind::Declarative)))?;
    Ok(GcEnv(id))
  }

  /// `NewFunctionEnvironment`: a declarative environment that also carries `this` (absent for
  /// arrow functions) and `new.target`.
  pub(crate) fn env_create_function(
    &mut self,
    outer: GcEnv,
    this_value: Option<Value>,
    new_target: Value,
  ) -> Result<GcEnv, VmError> {
    let mut record = EnvRecord::new(Some(outer), EnvKind::Declarative);
    record.this_value = this_value;
    record.new_target = new_target;
    Ok(GcEnv(self.alloc(HeapObject::Env(record))?))
  }

  /// `NewGlobalEnvironment(G, G)`.
  pub(crate) fn env_create_global(&mut self, global_object: GcObject) -> Result<GcEnv, VmError> {
    let mut record = EnvRecord::new(None, EnvKind::Global { global_object });
    record.this_value = Some(Value::Object(global_object));
    Ok(GcEnv(self.alloc(HeapObject::Env(record))?))
  }

  pub fn env_outer(&self, env: GcEnv) -> Result<Option<GcEnv>, VmError> {
    Ok(self.get_env(env)?.outer)
  }

  /// The global object of a global environment.
  pub(crate) fn env_global_object(&self, env: GcEnv) -> Result<Option<GcObject>, VmError> {
    Ok(match self.get_env(env)?.kind {
      EnvKind::Global { global_object } => Some(global_object),
      EnvKind::Declarative => None,
    })
  }

  /// Whether `env`'s own declarative part binds `name` (the global object is not consulted).
  pub fn env_has_lexical_binding(&self, env: GcEnv, name: &str) -> Result<bool, VmError> {
    Ok(self.get_env(env)?.find(name).is_some())
  }

  /// Creates an uninitialized binding, or an initialized one when `value` is given.
  pub(crate) fn env_create_binding(
    &mut self,
    env: GcEnv,
    name: &str,
    mutable: bool,
    value: Option<Value>,
  ) -> Result<(), VmError> {
    if self.get_env(env)?.find(name).is_some() {
      return Err(VmError::DeclarationConflict(name.to_string()));
    }
    self.ensure_can_allocate(mem::size_of::<EnvBinding>().saturating_add(name.len()))?;
    let record = self.get_env_mut(env)?;
    record.bindings.push(EnvBinding {
      name: name.into(),
      value: value.unwrap_or(Value::Undefined),
      mutable,
      initialized: value.is_some(),
    });
    self.refresh_slot_bytes(env.0);
    Ok(())
  }

  pub(crate) fn env_initialize_binding(
    &mut self,
    env: GcEnv,
    name: &str,
    value: Value,
  ) -> Result<(), VmError> {
    let binding = self
      .get_env_mut(env)?
      .find_mut(name)
      .ok_or(VmError::InternalInvariantViolation("initializing a missing binding"))?;
    binding.value = value;
    binding.initialized = true;
    Ok(())
  }

  /// `ResolveBinding(name, env)`.
  pub fn resolve_binding(&self, env: GcEnv, name: &str) -> Result<BindingRef, VmError> {
    let mut current = Some(env);
    while let Some(env) = current {
      let record = self.get_env(env)?;
      if record.find(name).is_some() {
        return Ok(BindingRef::Declarative(env));
      }
      if let EnvKind::Global { global_object } = record.kind {
        if self.has_property(global_object, name)? {
          return Ok(BindingRef::GlobalObject(global_object));
        }
      }
      current = record.outer;
    }
    Ok(BindingRef::Unresolvable)
  }

  /// `GetValue` on a resolved reference.
  pub fn get_binding_value(&self, binding: BindingRef, name: &str) -> Result<Value, VmError> {
    match binding {
      BindingRef::Declarative(env) => {
        let binding = self
          .get_env(env)?
          .find(name)
          .ok_or(VmError::InternalInvariantViolation("resolved binding disappeared"))?;
        if !binding.initialized {
          return Err(VmError::ReferenceError(format!(
            "Cannot access '{name}' before initialization"
          )));
        }
        Ok(binding.value)
      }
      BindingRef::GlobalObject(global) => self.get(global, name),
      BindingRef::Unresolvable => Err(not_defined(name)),
    }
  }

  /// `PutValue` on a resolved reference.
  ///
  /// An unresolvable name creates a global object property in sloppy mode and is a
  /// `ReferenceError` in strict mode; `global_object` is the realm's global for that case.
  pub fn set_binding_value(
    &mut self,
    binding: BindingRef,
    name: &str,
    value: Value,
    strict: bool,
    global_object: GcObject,
  ) -> Result<(), VmError> {
    match binding {
      BindingRef::Declarative(env) => {
        let binding = self
          .get_env_mut(env)?
          .find_mut(name)
          .ok_or(VmError::InternalInvariantViolation("resolved binding disappeared"))?;
        if !binding.initialized {
          return Err(VmError::ReferenceError(format!(
            "Cannot access '{name}' before initialization"
          )));
        }
        if !binding.mutable {
          return Err(VmError::TypeError("Assignment to constant variable.".to_string()));
        }
        binding.value = value;
        Ok(())
      }
      BindingRef::GlobalObject(global) => {
        if self.set(global, name, value)? || !strict {
          Ok(())
        } else {
          Err(VmError::TypeError(format!(
            "Cannot assign to read only property '{name}' of object"
          )))
        }
      }
      BindingRef::Unresolvable if strict => Err(not_defined(name)),
      BindingRef::Unresolvable => {
        self.define_own_property(global_object, name, PropertyDescriptor::data(value))?;
        Ok(())
      }
    }
  }

  /// `ResolveThisBinding`: the nearest environment that binds `this`.
  pub fn resolve_this(&self, env: GcEnv) -> Result<Value, VmError> {
    Ok(self.this_environment(env)?.0)
  }

  /// `GetNewTarget`: `new.target` of the nearest environment that binds `this`.
  pub fn resolve_new_target(&self, env: GcEnv) -> Result<Value, VmError> {
    Ok(self.this_environment(env)?.1)
  }

  fn this_environment(&self, env: GcEnv) -> Result<(Value, Value), VmError> {
    let mut current = Some(env);
    while let Some(env) = current {
      let record = self.get_env(env)?;
      if let Some(this) = record.this_value {
        return Ok((this, record.new_target));
      }
      current = record.outer;
    }
    Err(VmError::InternalInvariantViolation(
      "environment chain has no this binding",
    ))
  }
}

fn not_defined(name: &str) -> VmError {
  VmError::ReferenceError(format!("{name} is not defined"))
}
