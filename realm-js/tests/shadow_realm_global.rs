use realm_js::{
  GcObject, JsRuntime, ModuleLoadRequest, ModuleLoader, PromiseState, Value, VmError, VmOptions,
};
use std::cell::RefCell;
use std::rc::Rc;

fn as_rust_string(rt: &JsRuntime, value: Value) -> String {
  let Value::String(s) = value else {
    panic!("expected a string, got {value:?}");
  };
  rt.heap.get_string(s).unwrap().as_str().to_string()
}

#[test]
fn evaluate_returns_primitives() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  assert_eq!(
    rt.exec_script(realm, "var r = new ShadowRealm(); r.evaluate('1 + 2')")?,
    Value::Number(3.0)
  );
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn each_shadow_realm_gets_its_own_globals() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let result = rt.exec_script(
    realm,
    "var r1 = new ShadowRealm(); var r2 = new ShadowRealm();
     r1.evaluate('var shared = 1');
     r2.evaluate('typeof shared')",
  )?;
  assert_eq!(as_rust_string(&rt, result), "undefined");

  let r1 = rt.exec_script(realm, "r1")?.as_object().unwrap();
  let target = rt.heap.shadow_realm_target(r1)?.unwrap();
  assert_ne!(target, realm);
  assert_eq!(rt.exec_script(target, "shared")?, Value::Number(1.0));
  Ok(())
}

#[test]
fn evaluate_returns_callable_wrappers() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  assert_eq!(
    rt.exec_script(
      realm,
      "var r = new ShadowRealm(); var double = r.evaluate('(function (x) { return x * 2; })'); double(21)",
    )?,
    Value::Number(42.0)
  );
  Ok(())
}

#[test]
fn failures_surface_as_caller_errors() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  rt.exec_script(realm, "var r = new ShadowRealm();")?;

  let message = rt.exec_script(realm, "try { r.evaluate('throw 1'); } catch (e) { e.message; }")?;
  assert_eq!(
    as_rust_string(&rt, message),
    "The evaluated script did not complete normally"
  );
  assert_eq!(
    rt.exec_script(realm, "try { r.evaluate('throw 1'); } catch (e) { e.constructor === TypeError; }")?,
    Value::Bool(true)
  );
  assert_eq!(
    rt.exec_script(realm, "try { r.evaluate('1 +'); } catch (e) { e.constructor === SyntaxError; }")?,
    Value::Bool(true)
  );
  assert_eq!(
    rt.exec_script(realm, "try { r.evaluate('({})'); } catch (e) { e.constructor === TypeError; }")?,
    Value::Bool(true)
  );
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}

#[test]
fn argument_and_receiver_validation() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  rt.exec_script(realm, "var r = new ShadowRealm();")?;

  for source in [
    "try { ShadowRealm(); } catch (e) { e.constructor === TypeError; }",
    "try { r.evaluate(1); } catch (e) { e.constructor === TypeError; }",
    "try { var evaluate = r.evaluate; evaluate('1'); } catch (e) { e.constructor === TypeError; }",
    "try { r.importValue('./m.js', 1); } catch (e) { e.constructor === TypeError; }",
  ] {
    assert_eq!(rt.exec_script(realm, source)?, Value::Bool(true), "{source}");
  }
  Ok(())
}

#[derive(Clone, Default)]
struct RecordingLoader {
  requests: Rc<RefCell<Vec<ModuleLoadRequest>>>,
}

impl ModuleLoader for RecordingLoader {
  fn host_import_module_dynamically(&mut self, request: ModuleLoadRequest) {
    self.requests.borrow_mut().push(request);
  }
}

#[test]
fn import_value_loads_from_inside_the_shadow_realm() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let loader = RecordingLoader::default();
  rt.set_module_loader(Box::new(loader.clone()));
  let realm = rt.create_realm()?;

  rt.exec_script(
    realm,
    "var r = new ShadowRealm();
     var result;
     r.importValue('./greet.js', 'greet').then(function (greet) { result = greet('world'); });",
  )?;
  let shadow: GcObject = rt.exec_script(realm, "r")?.as_object().unwrap();
  let target = rt.heap.shadow_realm_target(shadow)?.unwrap();

  let request = loader.requests.borrow_mut().pop().unwrap();
  assert_eq!(request.specifier, "./greet.js");
  assert_eq!(request.referrer, target);

  let greet = rt.exec_script(target, "(function (name) { return 'hello ' + name; })")?;
  let namespace = rt.heap.create_module_namespace(&[("greet", greet)])?;
  rt.finish_dynamic_import(request, Ok(namespace))?;
  assert!(rt.perform_microtask_checkpoint().is_empty());

  let result = rt.exec_script(realm, "result")?;
  assert_eq!(as_rust_string(&rt, result), "hello world");
  Ok(())
}

#[test]
fn import_value_returns_a_caller_promise() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let promise = rt
    .exec_script(realm, "var r = new ShadowRealm(); r.importValue('./m.js', 'x')")?
    .as_object()
    .unwrap();
  assert!(rt.heap.is_promise(promise));
  let proto = rt.heap.realm_intrinsics(realm)?.promise_prototype;
  assert_eq!(rt.heap.object_prototype(promise)?, Some(proto));

  // No loader is installed.
  rt.perform_microtask_checkpoint();
  assert_eq!(rt.heap.promise_state(promise)?, PromiseState::Rejected);
  Ok(())
}
