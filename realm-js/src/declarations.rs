//! Declaration instantiation: hoisting `var`, function and lexical declarations into the
//! environments a script, eval body, function or block runs in.

use crate::property::PropertyDescriptor;
use crate::{GcEnv, GcObject, Heap, RealmId, Value, VmError};
use script_js::ast::func::{Func, FuncBody};
use script_js::ast::node::Node;
use script_js::ast::stmt::Stmt;
use script_js::decls::{function_declarations, lexically_declared_names, var_declared_names};

/// Names bound by `var` and by top-level function declarations.
fn var_scoped_names(body: &[Node<Stmt>]) -> Vec<&str> {
  let mut names = var_declared_names(body);
  names.extend(
    function_declarations(body)
      .into_iter()
      .filter_map(|f| f.stx.name.as_deref()),
  );
  names
}

/// Function declarations to instantiate, last declaration of a name winning.
fn functions_to_initialize(body: &[Node<Stmt>]) -> Vec<&Func> {
  let mut out: Vec<&Func> = Vec::new();
  for func in function_declarations(body).into_iter().rev() {
    if !out.iter().any(|f| f.name == func.stx.name) {
      out.push(&func.stx);
    }
  }
  out.reverse();
  out
}

/// `CanDeclareGlobalFunction`.
fn can_declare_global_function(heap: &Heap, global: GcObject, name: &str) -> Result<bool, VmError> {
  Ok(match heap.get_own_property(global, name)? {
    None => heap.get_object_base(global)?.extensible,
    Some(existing) => existing.configurable || (existing.writable && existing.enumerable),
  })
}

/// `CanDeclareGlobalVar`.
fn can_declare_global_var(heap: &Heap, global: GcObject, name: &str) -> Result<bool, VmError> {
  Ok(heap.has_own_property(global, name)? || heap.get_object_base(global)?.extensible)
}

/// `CreateGlobalFunctionBinding`.
fn create_global_function_binding(
  heap: &mut Heap,
  global: GcObject,
  name: &str,
  value: Value,
  deletable: bool,
) -> Result<(), VmError> {
  let desc = match heap.get_own_property(global, name)? {
    Some(existing) if !existing.configurable => PropertyDescriptor { value, ..existing },
    _ => PropertyDescriptor {
      value,
      writable: true,
      enumerable: true,
      configurable: deletable,
    },
  };
  heap.define_own_property_or_throw(global, name, desc)
}

/// `CreateGlobalVarBinding`.
fn create_global_var_binding(
  heap: &mut Heap,
  global: GcObject,
  name: &str,
  deletable: bool,
) -> Result<(), VmError> {
  if heap.has_own_property(global, name)? {
    return Ok(());
  }
  heap.define_own_property_or_throw(global, name, PropertyDescriptor {
    value: Value::Undefined,
    writable: true,
    enumerable: true,
    configurable: deletable,
  })
}

/// Whether `name` is a non-configurable own property of the global object.
fn has_restricted_global_property(heap: &Heap, global: GcObject, name: &str) -> Result<bool, VmError> {
  Ok(matches!(heap.get_own_property(global, name)?, Some(desc) if !desc.configurable))
}

/// `GlobalDeclarationInstantiation(script, env)`.
pub(crate) fn global_declaration_instantiation(
  heap: &mut Heap,
  realm: RealmId,
  body: &[Node<Stmt>],
  env: GcEnv,
) -> Result<(), VmError> {
  let global = heap.realm_global_object(realm)?;
  let lex_names = lexically_declared_names(body);
  let var_names = var_scoped_names(body);

  for lex in &lex_names {
    if heap.env_has_lexical_binding(env, lex.name)?
      || has_restricted_global_property(heap, global, lex.name)?
    {
      return Err(VmError::DeclarationConflict(lex.name.to_string()));
    }
  }
  for name in &var_names {
    if heap.env_has_lexical_binding(env, name)? {
      return Err(VmError::DeclarationConflict(name.to_string()));
    }
  }

  let functions = functions_to_initialize(body);
  for func in &functions {
    let name = func.name.as_deref().unwrap_or_default();
    if !can_declare_global_function(heap, global, name)? {
      return Err(VmError::DeclarationConflict(name.to_string()));
    }
  }
  for name in &var_names {
    if !can_declare_global_var(heap, global, name)? {
      return Err(VmError::DeclarationConflict(name.to_string()));
    }
  }

  for lex in &lex_names {
    heap.env_create_binding(env, lex.name, !lex.constant, None)?;
  }
  for func in functions {
    let closure = heap.alloc_ecma_function(realm, func, env)?;
    let name = func.name.as_deref().unwrap_or_default();
    create_global_function_binding(heap, global, name, Value::Object(closure), false)?;
  }
  for name in var_declared_names(body) {
    create_global_var_binding(heap, global, name, false)?;
  }
  Ok(())
}

/// `EvalDeclarationInstantiation(body, varEnv, lexEnv, null, strict)`.
///
/// Non-strict bodies declare their `var`s and functions on the realm's global object, so any of
/// those names already bound lexically in the global environment is a conflict.
pub(crate) fn eval_declaration_instantiation(
  heap: &mut Heap,
  realm: RealmId,
  body: &[Node<Stmt>],
  var_env: GcEnv,
  lex_env: GcEnv,
  strict: bool,
) -> Result<(), VmError> {
  let var_names = var_scoped_names(body);
  let global = heap.env_global_object(var_env)?.filter(|_| !strict);

  if global.is_some() {
    for name in &var_names {
      if heap.env_has_lexical_binding(var_env, name)? {
        return Err(VmError::DeclarationConflict(name.to_string()));
      }
    }
  }

  let functions = functions_to_initialize(body);
  if let Some(global) = global {
    for func in &functions {
      let name = func.name.as_deref().unwrap_or_default();
      if !can_declare_global_function(heap, global, name)? {
        return Err(VmError::DeclarationConflict(name.to_string()));
      }
    }
    for name in var_declared_names(body) {
      if !can_declare_global_var(heap, global, name)? {
        return Err(VmError::DeclarationConflict(name.to_string()));
      }
    }
  }

  for lex in lexically_declared_names(body) {
    heap.env_create_binding(lex_env, lex.name, !lex.constant, None)?;
  }

  for func in functions {
    let closure = Value::Object(heap.alloc_ecma_function(realm, func, lex_env)?);
    let name = func.name.as_deref().unwrap_or_default();
    match global {
      Some(global) => create_global_function_binding(heap, global, name, closure, true)?,
      None => bind_var(heap, var_env, name, closure)?,
    }
  }

  for name in var_declared_names(body) {
    match global {
      Some(global) => create_global_var_binding(heap, global, name, true)?,
      None if !heap.env_has_lexical_binding(var_env, name)? => {
        heap.env_create_binding(var_env, name, true, Some(Value::Undefined))?
      }
      None => {}
    }
  }
  Ok(())
}

/// Creates or overwrites a mutable, initialized binding.
fn bind_var(heap: &mut Heap, env: GcEnv, name: &str, value: Value) -> Result<(), VmError> {
  if heap.env_has_lexical_binding(env, name)? {
    heap.env_initialize_binding(env, name, value)
  } else {
    heap.env_create_binding(env, name, true, Some(value))
  }
}

/// `FunctionDeclarationInstantiation(func, args)`, with parameters, `var`s and lexical
/// declarations sharing the function environment.
pub(crate) fn function_declaration_instantiation(
  heap: &mut Heap,
  realm: RealmId,
  code: &Func,
  env: GcEnv,
  args: &[Value],
) -> Result<(), VmError> {
  for (i, name) in code.parameters.iter().enumerate() {
    let value = args.get(i).copied().unwrap_or(Value::Undefined);
    bind_var(heap, env, name, value)?;
  }

  let FuncBody::Block(body) = &code.body else {
    return Ok(());
  };
  for name in var_declared_names(body) {
    if !heap.env_has_lexical_binding(env, name)? {
      heap.env_create_binding(env, name, true, Some(Value::Undefined))?;
    }
  }
  for lex in lexically_declared_names(body) {
    heap.env_create_binding(env, lex.name, !lex.constant, None)?;
  }
  for func in functions_to_initialize(body) {
    let closure = Value::Object(heap.alloc_ecma_function(realm, func, env)?);
    bind_var(heap, env, func.name.as_deref().unwrap_or_default(), closure)?;
  }
  Ok(())
}

/// `BlockDeclarationInstantiation(code, env)`.
pub(crate) fn block_declaration_instantiation(
  heap: &mut Heap,
  realm: RealmId,
  body: &[Node<Stmt>],
  env: GcEnv,
) -> Result<(), VmError> {
  for lex in lexically_declared_names(body) {
    heap.env_create_binding(env, lex.name, !lex.constant, None)?;
  }
  for func in functions_to_initialize(body) {
    let closure = Value::Object(heap.alloc_ecma_function(realm, func, env)?);
    bind_var(heap, env, func.name.as_deref().unwrap_or_default(), closure)?;
  }
  Ok(())
}

/// Whether a statement list needs its own block environment.
pub(crate) fn has_block_scoped_declarations(body: &[Node<Stmt>]) -> bool {
  !lexically_declared_names(body).is_empty() || !function_declarations(body).is_empty()
}
