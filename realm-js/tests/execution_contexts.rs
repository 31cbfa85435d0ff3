use realm_js::{ExecutionContext, JsRuntime, Value, VmError, VmOptions};

#[test]
fn push_pop_tracks_the_running_realm() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;
  assert_eq!(rt.vm.current_realm(), None);

  let ctx_a = ExecutionContext::for_realm(&rt.heap, a)?;
  let ctx_b = ExecutionContext::for_realm(&rt.heap, b)?;
  let slot_a = rt.vm.push_execution_context(ctx_a)?;
  let slot_b = rt.vm.push_execution_context(ctx_b)?;
  assert_eq!(rt.vm.current_realm(), Some(b));
  assert_eq!(rt.vm.realm_stack(), vec![a, b]);
  assert_eq!(slot_b.depth(), 1);

  assert_eq!(rt.vm.pop_execution_context(slot_b)?, ctx_b);
  assert_eq!(rt.vm.current_realm(), Some(a));
  assert_eq!(rt.vm.pop_execution_context(slot_a)?, ctx_a);
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn out_of_order_pop_is_an_invariant_violation() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let ctx = ExecutionContext::for_realm(&rt.heap, realm)?;

  let outer = rt.vm.push_execution_context(ctx)?;
  let inner = rt.vm.push_execution_context(ctx)?;
  assert!(matches!(
    rt.vm.pop_execution_context(outer),
    Err(VmError::InternalInvariantViolation(_))
  ));
  assert_eq!(rt.vm.depth(), 2);

  rt.vm.pop_execution_context(inner)?;
  assert_eq!(rt.vm.depth(), 1);
  Ok(())
}

#[test]
fn guard_pops_on_drop() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let ctx = ExecutionContext::for_realm(&rt.heap, realm)?;

  {
    let guard = rt.enter_execution_context(ctx)?;
    assert_eq!(guard.vm.current_realm(), Some(realm));
  }
  assert_eq!(rt.vm.depth(), 0);

  let guard = rt.enter_execution_context(ctx)?;
  assert_eq!(guard.exit()?, ctx);
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn pushing_past_the_depth_limit_overflows() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions {
    max_stack_depth: 2,
    ..VmOptions::default()
  });
  let realm = rt.create_realm()?;
  let ctx = ExecutionContext::for_realm(&rt.heap, realm)?;

  let first = rt.vm.push_execution_context(ctx)?;
  let second = rt.vm.push_execution_context(ctx)?;
  assert!(matches!(
    rt.vm.push_execution_context(ctx),
    Err(VmError::StackOverflow)
  ));
  rt.vm.pop_execution_context(second)?;
  rt.vm.pop_execution_context(first)?;
  Ok(())
}

#[test]
fn runaway_recursion_overflows_under_default_options() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;

  let err = rt
    .exec_script(realm, "function f() { return f(); } f();")
    .unwrap_err();
  assert!(matches!(err, VmError::StackOverflow));
  assert_eq!(rt.vm.depth(), 0);

  let err = rt
    .exec_script(realm, "function g(n) { return 1 + g(n + 1) * 2; } g(0);")
    .unwrap_err();
  assert!(matches!(err, VmError::StackOverflow));
  assert_eq!(rt.vm.depth(), 0);

  // The runtime stays usable afterwards.
  assert_eq!(
    rt.exec_script(realm, "function h(n) { return n ? h(n - 1) + 1 : 0; } h(5)")?,
    Value::Number(5.0)
  );
  Ok(())
}

#[test]
fn runaway_recursion_overflows_and_restores_the_stack() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions {
    max_stack_depth: 32,
    ..VmOptions::default()
  });
  let realm = rt.create_realm()?;

  let err = rt
    .exec_script(realm, "function f() { return f(); } f();")
    .unwrap_err();
  assert!(matches!(err, VmError::StackOverflow));
  assert_eq!(rt.vm.depth(), 0);

  // Overflow is not catchable from script.
  let err = rt
    .exec_script(realm, "try { f(); } catch (e) { 1; }")
    .unwrap_err();
  assert!(matches!(err, VmError::StackOverflow));
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn native_functions_run_in_their_own_realm() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let a = rt.create_realm()?;
  let b = rt.create_realm()?;

  let sample = rt.heap.alloc_native_function(b, "sample", 0, false, |rt, _call| {
    Ok(Value::Bool(rt.vm.realm_stack().len() == 2))
  })?;
  let global_a = rt.heap.realm_global_object(a)?;
  rt.heap.set(global_a, "sample", Value::Object(sample))?;

  assert_eq!(rt.exec_script(a, "sample()")?, Value::Bool(true));
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}
