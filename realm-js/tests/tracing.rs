use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;

use realm_js::{JsRuntime, Value, VmError, VmOptions};

#[derive(Clone, Default)]
struct SharedWriter {
  buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
  fn contents(&self) -> String {
    String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
  }
}

struct SharedWriterGuard<'a> {
  buffer: &'a Arc<Mutex<Vec<u8>>>,
}

impl<'a> io::Write for SharedWriterGuard<'a> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buffer.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> MakeWriter<'a> for SharedWriter {
  type Writer = SharedWriterGuard<'a>;

  fn make_writer(&'a self) -> Self::Writer {
    SharedWriterGuard {
      buffer: &self.buffer,
    }
  }
}

fn capture(f: impl FnOnce()) -> String {
  let writer = SharedWriter::default();
  let subscriber = tracing_subscriber::fmt()
    .with_writer(writer.clone())
    .with_max_level(tracing::Level::TRACE)
    .with_span_events(FmtSpan::CLOSE)
    .with_ansi(false)
    .finish();
  tracing::subscriber::with_default(subscriber, f);
  writer.contents()
}

#[test]
fn evaluate_emits_spans_and_wrapper_events() {
  let output = capture(|| {
    let mut rt = JsRuntime::new(VmOptions::default());
    let caller = rt.create_realm().unwrap();
    let target = rt.create_realm().unwrap();
    let f = rt.evaluate("(function () {})", caller, target).unwrap();
    assert!(matches!(f, Value::Object(_)));
  });

  assert!(output.contains("realm_js::shadow_realm"), "{output}");
  assert!(output.contains("evaluate"), "{output}");
  assert!(output.contains("wrapped callable created"), "{output}");
  assert!(output.contains("push execution context"), "{output}");
}

#[test]
fn opaque_failures_keep_the_cause_in_debug_logs() {
  let output = capture(|| {
    let mut rt = JsRuntime::new(VmOptions::default());
    let caller = rt.create_realm().unwrap();
    let target = rt.create_realm().unwrap();
    assert!(rt.evaluate("missingName", caller, target).is_err());
  });

  assert!(output.contains("evaluation did not complete normally"), "{output}");
  assert!(output.contains("missingName"), "{output}");
}

#[test]
fn declaration_conflicts_are_logged_before_becoming_opaque() {
  let output = capture(|| {
    let mut rt = JsRuntime::new(VmOptions::default());
    let caller = rt.create_realm().unwrap();
    let target = rt.create_realm().unwrap();
    rt.exec_script(target, "let conflicting = 1;").unwrap();
    assert!(matches!(
      rt.evaluate("var conflicting;", caller, target),
      Err(VmError::EvaluationFailed)
    ));
  });

  assert!(output.contains("evaluation did not complete normally"), "{output}");
  assert!(output.contains("conflicting"), "{output}");
}

#[test]
fn collections_are_logged() {
  let output = capture(|| {
    let mut rt = JsRuntime::new(VmOptions::default());
    rt.create_realm().unwrap();
    rt.collect_garbage();
  });

  assert!(output.contains("realm_js::gc"), "{output}");
}
