use realm_js::{JsRuntime, RealmId, Value, VmError, VmOptions};

fn setup() -> Result<(JsRuntime, RealmId, RealmId), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let caller = rt.create_realm()?;
  let target = rt.create_realm()?;
  Ok((rt, caller, target))
}

fn as_rust_string(rt: &JsRuntime, value: Value) -> String {
  let Value::String(s) = value else {
    panic!("expected a string, got {value:?}");
  };
  rt.heap.get_string(s).unwrap().as_str().to_string()
}

#[test]
fn evaluates_expressions_in_the_target_realm() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(rt.evaluate("1 + 1", caller, target)?, Value::Number(2.0));
  assert_eq!(rt.vm.depth(), 0);

  let value = rt.evaluate("'a' + 'b'", caller, target)?;
  assert_eq!(as_rust_string(&rt, value), "ab");
  Ok(())
}

#[test]
fn empty_source_evaluates_to_undefined() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(rt.evaluate("", caller, target)?, Value::Undefined);
  assert_eq!(rt.evaluate("  // nothing here\n", caller, target)?, Value::Undefined);
  assert_eq!(rt.evaluate("var unused;", caller, target)?, Value::Undefined);
  Ok(())
}

#[test]
fn completion_value_skips_empty_statements() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(rt.evaluate("1; var x;", caller, target)?, Value::Number(1.0));
  assert_eq!(
    rt.evaluate("let i = 0; while (i < 3) { i = i + 1; } i", caller, target)?,
    Value::Number(3.0)
  );
  Ok(())
}

#[test]
fn syntax_errors_are_reported_before_anything_runs() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert!(matches!(rt.evaluate("1 +", caller, target), Err(VmError::Syntax(_))));
  assert_eq!(rt.vm.depth(), 0);

  // A script with a syntax error declares nothing.
  assert!(matches!(
    rt.evaluate("var leaked = 1; 1 +", caller, target),
    Err(VmError::Syntax(_))
  ));
  let global = rt.heap.realm_global_object(target)?;
  assert!(!rt.heap.has_own_property(global, "leaked")?);
  Ok(())
}

#[test]
fn new_target_and_super_are_rejected_outside_functions() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  for source in ["new.target", "() => new.target", "super.x", "() => super.x"] {
    assert!(
      matches!(rt.evaluate(source, caller, target), Err(VmError::Syntax(_))),
      "{source} should be rejected"
    );
    assert_eq!(rt.vm.depth(), 0);
  }

  // Inside an ordinary function `new.target` is fine.
  assert_eq!(
    rt.evaluate("function f() { return new.target; } f()", caller, target)?,
    Value::Undefined
  );
  Ok(())
}

#[test]
fn abrupt_completions_become_opaque_failures() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  for source in [
    "throw 1",
    "throw new Error('secret')",
    "undefinedName",
    "null.x",
    "(function () { throw 'inner'; })()",
  ] {
    assert!(
      matches!(rt.evaluate(source, caller, target), Err(VmError::EvaluationFailed)),
      "{source} should fail opaquely"
    );
    assert_eq!(rt.vm.depth(), 0);
  }
  Ok(())
}

#[test]
fn caught_exceptions_do_not_fail_the_evaluation() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(
    rt.evaluate("try { throw 1; } catch (e) { e + 1; }", caller, target)?,
    Value::Number(2.0)
  );
  Ok(())
}

#[test]
fn sloppy_var_declarations_persist_on_the_target_global() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  rt.evaluate("var counter = 5; function bump() { counter = counter + 1; }", caller, target)?;
  rt.evaluate("bump()", caller, target)?;
  assert_eq!(rt.evaluate("counter", caller, target)?, Value::Number(6.0));
  assert_eq!(rt.exec_script(target, "counter")?, Value::Number(6.0));

  let global = rt.heap.realm_global_object(target)?;
  assert_eq!(rt.heap.get(global, "counter")?, Value::Number(6.0));
  Ok(())
}

#[test]
fn lexical_declarations_do_not_persist() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(rt.evaluate("let y = 1; y", caller, target)?, Value::Number(1.0));
  let value = rt.evaluate("typeof y", caller, target)?;
  assert_eq!(as_rust_string(&rt, value), "undefined");
  Ok(())
}

#[test]
fn strict_var_declarations_do_not_persist() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert_eq!(
    rt.evaluate("'use strict'; var z = 1; z", caller, target)?,
    Value::Number(1.0)
  );
  let value = rt.evaluate("typeof z", caller, target)?;
  assert_eq!(as_rust_string(&rt, value), "undefined");
  Ok(())
}

#[test]
fn var_conflicting_with_a_global_lexical_binding_fails_opaquely() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  rt.exec_script(target, "let x = 1;")?;
  assert!(matches!(
    rt.evaluate("var x = 2;", caller, target),
    Err(VmError::EvaluationFailed)
  ));
  assert_eq!(rt.vm.depth(), 0);
  assert_eq!(rt.exec_script(target, "x")?, Value::Number(1.0));
  Ok(())
}

#[test]
fn realms_do_not_share_globals() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  rt.evaluate("globalThis.marker = 1", caller, target)?;
  let value = rt.exec_script(caller, "typeof marker")?;
  assert_eq!(as_rust_string(&rt, value), "undefined");
  assert_eq!(rt.exec_script(target, "marker")?, Value::Number(1.0));
  Ok(())
}

#[test]
fn object_results_are_refused() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert!(matches!(
    rt.evaluate("({ secret: 1 })", caller, target),
    Err(VmError::NonFunctionObjectNotTransferable)
  ));
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn function_results_come_back_wrapped() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  let value = rt.evaluate("(function add(a, b) { return a + b; })", caller, target)?;
  let Value::Object(wrapper) = value else {
    panic!("expected a function, got {value:?}");
  };
  assert!(rt.heap.is_wrapped_function(wrapper));
  assert_eq!(rt.heap.function_realm(wrapper)?, caller);
  let (_, origin) = rt.heap.wrapped_function_target(wrapper)?.unwrap();
  assert_eq!(origin, target);

  let name = rt.heap.get(wrapper, "name")?;
  assert_eq!(as_rust_string(&rt, name), "add");
  assert_eq!(rt.heap.get(wrapper, "length")?, Value::Number(2.0));

  assert_eq!(
    rt.call(value, Value::Undefined, &[Value::Number(1.0), Value::Number(2.0)])?,
    Value::Number(3.0)
  );
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn evaluation_depth_overflow_is_fatal() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions {
    max_stack_depth: 32,
    ..VmOptions::default()
  });
  let caller = rt.create_realm()?;
  let target = rt.create_realm()?;
  assert!(matches!(
    rt.evaluate("function f() { return f(); } f()", caller, target),
    Err(VmError::StackOverflow)
  ));
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn evaluation_overflow_under_default_options_is_fatal() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  assert!(matches!(
    rt.evaluate("function f() { return f(); } f()", caller, target),
    Err(VmError::StackOverflow)
  ));
  assert_eq!(rt.vm.depth(), 0);
  assert_eq!(rt.evaluate("1 + 1", caller, target)?, Value::Number(2.0));
  Ok(())
}

#[test]
fn deeply_nested_source_is_a_syntax_error() -> Result<(), VmError> {
  let (mut rt, caller, target) = setup()?;
  for n in [300, 3000] {
    let source = format!("{}1{}", "(".repeat(n), ")".repeat(n));
    assert!(matches!(
      rt.evaluate(&source, caller, target),
      Err(VmError::Syntax(_))
    ));
    assert_eq!(rt.vm.depth(), 0);
  }
  let blocks = format!("{}1{}", "{".repeat(300), "}".repeat(300));
  assert!(matches!(
    rt.evaluate(&blocks, caller, target),
    Err(VmError::Syntax(_))
  ));
  let unary = format!("{}1", "!".repeat(300));
  assert!(matches!(
    rt.evaluate(&unary, caller, target),
    Err(VmError::Syntax(_))
  ));

  let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
  assert_eq!(rt.evaluate(&source, caller, target)?, Value::Number(1.0));
  Ok(())
}
