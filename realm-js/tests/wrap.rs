use realm_js::{JsRuntime, RealmId, Value, VmError, VmOptions};
use std::cell::RefCell;
use std::rc::Rc;

fn as_rust_string(rt: &JsRuntime, value: Value) -> String {
  let Value::String(s) = value else {
    panic!("expected a string, got {value:?}");
  };
  rt.heap.get_string(s).unwrap().as_str().to_string()
}

fn install(rt: &mut JsRuntime, realm: RealmId, name: &str, value: Value) -> Result<(), VmError> {
  let global = rt.heap.realm_global_object(realm)?;
  rt.heap.set(global, name, value)?;
  Ok(())
}

#[test]
fn primitives_pass_through_unchanged() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let s = rt.heap.alloc_string("hello")?;
  for value in [
    Value::Undefined,
    Value::Null,
    Value::Bool(true),
    Value::Number(-0.5),
    Value::String(s),
  ] {
    assert_eq!(rt.wrap(value, realm)?, value);
  }
  Ok(())
}

#[test]
fn plain_objects_are_not_transferable() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let obj = rt.exec_script(b, "({ x: 1 })")?;
  assert!(matches!(
    rt.wrap(obj, a),
    Err(VmError::NonFunctionObjectNotTransferable)
  ));
  Ok(())
}

#[test]
fn wrappers_copy_name_and_length() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let sample = rt
    .heap
    .alloc_native_function(b, "sample", 3, false, |_rt, _call| Ok(Value::Undefined))?;

  let wrapped = rt.wrap(Value::Object(sample), a)?;
  let Value::Object(wrapper) = wrapped else {
    panic!("expected a wrapper");
  };
  let name = rt.heap.get(wrapper, "name")?;
  assert_eq!(as_rust_string(&rt, name), "sample");
  assert_eq!(rt.heap.get(wrapper, "length")?, Value::Number(3.0));
  assert_eq!(rt.heap.edge_count(wrapper), 1);
  Ok(())
}

#[test]
fn wrapping_twice_yields_distinct_wrappers() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let f = rt.exec_script(b, "(function () { return 1; })")?;
  let first = rt.wrap(f, a)?;
  let second = rt.wrap(f, a)?;
  assert_ne!(first, second);
  Ok(())
}

#[test]
fn wrapped_calls_run_in_the_origin_realm() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;

  let seen: Rc<RefCell<Vec<RealmId>>> = Rc::default();
  let recorder = seen.clone();
  let sample = rt.heap.alloc_native_function(b, "sample", 0, false, move |rt, _call| {
    recorder.borrow_mut().extend(rt.vm.current_realm());
    Ok(Value::Number(7.0))
  })?;
  let wrapped = rt.wrap(Value::Object(sample), a)?;
  install(&mut rt, a, "sample", wrapped)?;

  assert_eq!(rt.exec_script(a, "sample()")?, Value::Number(7.0));
  assert_eq!(*seen.borrow(), vec![b]);
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn arguments_and_results_are_wrapped_across_the_boundary() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;

  let apply = rt.evaluate("(function (f, x) { return f(x) + 1; })", a, b)?;
  install(&mut rt, a, "apply", apply)?;
  assert_eq!(
    rt.exec_script(a, "apply(function (x) { return x * 2; }, 20)")?,
    Value::Number(41.0)
  );

  let identity = rt.evaluate("(function (f) { return f; })", a, b)?;
  install(&mut rt, a, "identity", identity)?;
  let returned = rt.exec_script(a, "var g = function () {}; identity(g) === g")?;
  assert_eq!(returned, Value::Bool(false));
  Ok(())
}

#[test]
fn object_arguments_throw_a_caller_type_error() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let f = rt.evaluate("(function (x) { return x; })", a, b)?;
  install(&mut rt, a, "f", f)?;

  assert_eq!(
    rt.exec_script(a, "try { f({}); } catch (e) { e.constructor === TypeError; }")?,
    Value::Bool(true)
  );
  let message = rt.exec_script(a, "try { f({}); } catch (e) { e.message; }")?;
  assert_eq!(
    as_rust_string(&rt, message),
    "Wrapped value must be primitive or a function object"
  );

  // Returning an object is refused the same way.
  let leak = rt.evaluate("(function () { return { secret: 1 }; })", a, b)?;
  install(&mut rt, a, "leak", leak)?;
  assert_eq!(
    rt.exec_script(a, "try { leak(); } catch (e) { e.constructor === TypeError; }")?,
    Value::Bool(true)
  );
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn thrown_primitives_cross_unchanged() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let f = rt.evaluate("(function () { throw 'boom'; })", a, b)?;
  install(&mut rt, a, "f", f)?;

  let caught = rt.exec_script(a, "try { f(); } catch (e) { e; }")?;
  assert_eq!(as_rust_string(&rt, caught), "boom");
  Ok(())
}

#[test]
fn thrown_objects_become_caller_type_errors() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let f = rt.evaluate("(function () { throw new RangeError('inner detail'); })", a, b)?;
  install(&mut rt, a, "f", f)?;

  assert_eq!(
    rt.exec_script(a, "try { f(); } catch (e) { e.constructor === TypeError; }")?,
    Value::Bool(true)
  );
  let message = rt.exec_script(a, "try { f(); } catch (e) { e.message; }")?;
  assert_ne!(as_rust_string(&rt, message), "inner detail");
  Ok(())
}

#[test]
fn double_wrapping_forwards_through_both_hops() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let c = rt.create_realm()?;

  let f = rt.exec_script(c, "(function (x) { return x + 1; })")?;
  let in_b = rt.wrap(f, b)?;
  let in_a = rt.wrap(in_b, a)?;
  let Value::Object(outer) = in_a else {
    panic!("expected a wrapper");
  };
  assert_eq!(rt.heap.function_realm(outer)?, a);
  assert_eq!(
    rt.heap.wrapped_function_target(outer)?,
    in_b.as_object().map(|inner| (inner, b))
  );

  assert_eq!(
    rt.call(in_a, Value::Undefined, &[Value::Number(1.0)])?,
    Value::Number(2.0)
  );
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn nested_cross_realm_calls_unwind_in_order() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;

  let stacks: Rc<RefCell<Vec<Vec<RealmId>>>> = Rc::default();
  let recorder = stacks.clone();
  let callback = rt.heap.alloc_native_function(a, "callback", 0, false, move |rt, _call| {
    recorder.borrow_mut().push(rt.vm.realm_stack());
    Ok(Value::Number(1.0))
  })?;
  let callback_in_b = rt.wrap(Value::Object(callback), b)?;
  install(&mut rt, b, "callback", callback_in_b)?;

  let run = rt.evaluate("(function () { return callback() + callback(); })", a, b)?;
  install(&mut rt, a, "run", run)?;
  assert_eq!(rt.exec_script(a, "run()")?, Value::Number(2.0));

  // script(A) -> wrapper(B) -> run(B) -> wrapper(A) -> callback(A)
  let stacks = stacks.borrow();
  assert_eq!(stacks.len(), 2);
  assert_eq!(stacks[0], vec![a, b, b, a, a]);
  assert_eq!(stacks[0], stacks[1]);
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn wrappers_are_not_constructors() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  let ctor = rt.evaluate("(function Point() {})", a, b)?;
  assert!(!rt.heap.is_constructor(ctor));
  assert!(matches!(
    rt.construct(ctor, &[], None),
    Err(VmError::NotConstructable)
  ));
  Ok(())
}
