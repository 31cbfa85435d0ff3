use realm_js::{HeapLimits, JsRuntime, Value, VmError, VmOptions};

#[test]
fn registered_edges_keep_realms_alive() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let holder = rt.heap.alloc_object(None)?;
  rt.heap.register_edge(holder, realm)?;
  // Registering the same edge again is a no-op.
  rt.heap.register_edge(holder, realm)?;
  assert_eq!(rt.heap.edge_count(holder), 1);

  let root = rt.heap.add_root(Value::Object(holder));
  rt.collect_garbage();
  assert!(rt.heap.realm_global_object(realm).is_ok());

  rt.heap.remove_root(root);
  rt.collect_garbage();
  assert!(matches!(
    rt.heap.realm_global_object(realm),
    Err(VmError::InvalidHandle)
  ));
  Ok(())
}

#[test]
fn wrappers_keep_their_origin_realm_alive() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let caller = rt.create_realm()?;
  let origin = rt.create_realm()?;
  let f = rt.exec_script(origin, "(function () { return 7; })")?;
  let wrapper = rt.wrap(f, caller)?;
  let root = rt.heap.add_root(wrapper);

  rt.collect_garbage();
  assert!(rt.heap.realm_global_object(origin).is_ok());
  assert_eq!(rt.call(wrapper, Value::Undefined, &[])?, Value::Number(7.0));

  rt.heap.remove_root(root);
  rt.collect_garbage();
  assert!(rt.heap.realm_global_object(origin).is_err());
  assert!(rt.heap.realm_global_object(caller).is_err());
  Ok(())
}

#[test]
fn unreachable_realms_are_collected() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  assert!(rt.heap.live_allocations() > 0);

  rt.collect_garbage();
  assert!(rt.heap.realm_global_object(realm).is_err());
  assert_eq!(rt.heap.live_allocations(), 0);
  Ok(())
}

#[test]
fn allocation_never_collects() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions {
    heap_limits: HeapLimits::new(64 * 1024 * 1024, 1),
    ..VmOptions::default()
  });
  let realm = rt.create_realm()?;
  for _ in 0..100 {
    rt.heap.alloc_object(None)?;
  }
  rt.exec_script(realm, "var x = { a: 1 }; x.a")?;
  assert_eq!(rt.heap.gc_runs(), 0);
  assert!(rt.heap.realm_global_object(realm).is_ok());

  // The checkpoint is a safe point: the stack is empty and the heap is over its threshold.
  rt.perform_microtask_checkpoint();
  assert_eq!(rt.heap.gc_runs(), 1);
  assert!(rt.heap.realm_global_object(realm).is_err());
  Ok(())
}

#[test]
fn running_contexts_are_roots() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions::default());
  let realm = rt.create_realm()?;
  let collect = rt.heap.alloc_native_function(realm, "collect", 0, false, |rt, _call| {
    rt.collect_garbage();
    Ok(Value::Undefined)
  })?;
  let global = rt.heap.realm_global_object(realm)?;
  rt.heap.set(global, "collect", Value::Object(collect))?;

  assert_eq!(
    rt.exec_script(realm, "var before = 1; collect(); before + 1")?,
    Value::Number(2.0)
  );
  assert_eq!(rt.heap.gc_runs(), 1);
  Ok(())
}

#[test]
fn out_of_memory_is_fatal() -> Result<(), VmError> {
  let mut rt = JsRuntime::new(VmOptions {
    heap_limits: HeapLimits::new(256 * 1024, 256 * 1024),
    ..VmOptions::default()
  });
  let realm = rt.create_realm()?;
  let err = rt
    .exec_script(
      realm,
      "var chain = {}; while (true) { chain = { next: chain }; }",
    )
    .unwrap_err();
  assert!(matches!(err, VmError::OutOfMemory));
  assert_eq!(rt.vm.depth(), 0);
  Ok(())
}
