use proptest::prelude::*;
use realm_js::{JsRuntime, Value, VmError, VmOptions};

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn numbers_and_strings_cross_unchanged(n in any::<f64>(), s in "[a-z0-9 ]{0,16}") {
    let mut rt = JsRuntime::new(VmOptions::default());
    let realm = rt.create_realm().unwrap();

    let number = Value::Number(n);
    prop_assert!(rt.wrap(number, realm).unwrap().same_value(number, &rt.heap));

    let string = Value::String(rt.heap.alloc_string(&s).unwrap());
    prop_assert_eq!(rt.wrap(string, realm).unwrap(), string);
  }

  #[test]
  fn evaluate_leaves_the_stack_balanced(a in -1000i32..1000, b in -1000i32..1000, fail in any::<bool>()) {
    let mut rt = JsRuntime::new(VmOptions::default());
    let caller = rt.create_realm().unwrap();
    let target = rt.create_realm().unwrap();

    let source = if fail {
      format!("var n = {a} + {b}; throw n;")
    } else {
      format!("var n = {a} + {b}; n")
    };
    let result = rt.evaluate(&source, caller, target);
    prop_assert_eq!(rt.vm.depth(), 0);
    if fail {
      prop_assert!(matches!(result, Err(VmError::EvaluationFailed)));
    } else {
      prop_assert_eq!(result.unwrap(), Value::Number(f64::from(a) + f64::from(b)));
    }
  }

  #[test]
  fn nested_wrappers_unwind_completely(depth in 1usize..6) {
    let mut rt = JsRuntime::new(VmOptions::default());
    let realms: Vec<_> = (0..=depth).map(|_| rt.create_realm().unwrap()).collect();

    // Wrap a function from the last realm through every other realm in turn.
    let mut value = rt.exec_script(realms[depth], "(function (x) { return x + 1; })").unwrap();
    for realm in realms[..depth].iter().rev() {
      value = rt.wrap(value, *realm).unwrap();
    }
    let result = rt.call(value, Value::Undefined, &[Value::Number(1.0)]).unwrap();
    prop_assert_eq!(result, Value::Number(2.0));
    prop_assert_eq!(rt.vm.depth(), 0);
  }
}
