use crate::execution_context::ExecutionContext;
use crate::heap::{HeapLimits, Trace, Tracer};
use crate::{JsRuntime, RealmId, VmError};
use core::ops::{Deref, DerefMut};

/// Construction-time runtime options.
#[derive(Debug, Clone)]
pub struct VmOptions {
  /// Maximum depth of the execution context stack. Pushing beyond it fails with
  /// [`VmError::StackOverflow`].
  pub max_stack_depth: usize,
  /// Native stack the runtime may use below the outermost execution context. Contexts and
  /// evaluator recursion beyond it fail with [`VmError::StackOverflow`].
  pub max_native_stack_bytes: usize,
  pub heap_limits: HeapLimits,
}

impl Default for VmOptions {
  fn default() -> Self {
    Self {
      max_stack_depth: 128,
      // Leaves room for the parser and the host on a 2 MiB thread in debug builds.
      max_native_stack_bytes: 512 * 1024,
      heap_limits: HeapLimits::default(),
    }
  }
}

// Approximate native stack pointer of the caller.
#[inline(never)]
fn native_stack_address() -> usize {
  let marker = 0u8;
  core::hint::black_box(&marker) as *const u8 as usize
}

/// Proof of a push onto the execution context stack, consumed by the matching pop.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "every pushed execution context must be popped"]
pub struct StackSlot(usize);

impl StackSlot {
  /// Stack depth just below this context.
  pub fn depth(&self) -> usize {
    self.0
  }
}

/// The execution context stack.
#[derive(Debug)]
pub struct Vm {
  options: VmOptions,
  stack: Vec<ExecutionContext>,
  // Native stack address recorded when the stack was last entered from empty.
  native_base: Option<usize>,
}

impl Vm {
  pub fn new(options: VmOptions) -> Self {
    Self {
      options,
      stack: Vec::new(),
      native_base: None,
    }
  }

  pub fn options(&self) -> &VmOptions {
    &self.options
  }

  pub fn push_execution_context(&mut self, ctx: ExecutionContext) -> Result<StackSlot, VmError> {
    if self.stack.len() >= self.options.max_stack_depth {
      tracing::debug!(target: "realm_js::vm", depth = self.stack.len(), "stack overflow");
      return Err(VmError::StackOverflow);
    }
    if self.stack.is_empty() {
      self.native_base = Some(native_stack_address());
    } else {
      self.check_native_stack()?;
    }
    let slot = StackSlot(self.stack.len());
    self.stack.push(ctx);
    tracing::trace!(target: "realm_js::vm", depth = self.stack.len(), realm = ?ctx.realm, "push execution context");
    Ok(slot)
  }

  /// Pops the context pushed as `slot`, which must be the running one.
  pub fn pop_execution_context(&mut self, slot: StackSlot) -> Result<ExecutionContext, VmError> {
    if self.stack.is_empty() {
      return Err(VmError::InternalInvariantViolation(
        "pop from an empty execution context stack",
      ));
    }
    if slot.0 + 1 != self.stack.len() {
      return Err(VmError::InternalInvariantViolation(
        "execution context popped out of LIFO order",
      ));
    }
    let ctx = self
      .stack
      .pop()
      .ok_or(VmError::InternalInvariantViolation("execution context stack underflow"))?;
    if self.stack.is_empty() {
      self.native_base = None;
    }
    tracing::trace!(target: "realm_js::vm", depth = self.stack.len(), realm = ?ctx.realm, "pop execution context");
    Ok(ctx)
  }

  /// Fails with [`VmError::StackOverflow`] once the native stack used since the outermost context
  /// was pushed exceeds [`VmOptions::max_native_stack_bytes`].
  pub fn check_native_stack(&self) -> Result<(), VmError> {
    let Some(base) = self.native_base else {
      return Ok(());
    };
    let used = base.abs_diff(native_stack_address());
    if used > self.options.max_native_stack_bytes {
      tracing::debug!(target: "realm_js::vm", depth = self.stack.len(), used, "native stack budget exhausted");
      return Err(VmError::StackOverflow);
    }
    Ok(())
  }

  pub fn running_execution_context(&self) -> Option<&ExecutionContext> {
    self.stack.last()
  }

  pub(crate) fn running_execution_context_mut(&mut self) -> Option<&mut ExecutionContext> {
    self.stack.last_mut()
  }

  /// The realm of the running execution context.
  pub fn current_realm(&self) -> Option<RealmId> {
    self.stack.last().map(|ctx| ctx.realm)
  }

  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  /// Realms of the stack, bottom first.
  pub fn realm_stack(&self) -> Vec<RealmId> {
    self.stack.iter().map(|ctx| ctx.realm).collect()
  }
}

impl Trace for Vm {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    for ctx in &self.stack {
      ctx.trace(tracer);
    }
  }
}

/// Scoped execution context: pushed on creation, popped when dropped.
///
/// Derefs to the runtime so work can run "inside" the context. Use [`ExecutionContextGuard::exit`]
/// to observe a failing pop; dropping only logs it.
pub struct ExecutionContextGuard<'a> {
  rt: &'a mut JsRuntime,
  slot: Option<StackSlot>,
}

impl JsRuntime {
  pub fn enter_execution_context(
    &mut self,
    ctx: ExecutionContext,
  ) -> Result<ExecutionContextGuard<'_>, VmError> {
    let slot = self.vm.push_execution_context(ctx)?;
    Ok(ExecutionContextGuard {
      rt: self,
      slot: Some(slot),
    })
  }
}

impl ExecutionContextGuard<'_> {
  /// Pops the context now, reporting a broken stack discipline.
  pub fn exit(mut self) -> Result<ExecutionContext, VmError> {
    match self.slot.take() {
      Some(slot) => self.rt.vm.pop_execution_context(slot),
      None => Err(VmError::InternalInvariantViolation("execution context already exited")),
    }
  }
}

impl Deref for ExecutionContextGuard<'_> {
  type Target = JsRuntime;

  fn deref(&self) -> &JsRuntime {
    self.rt
  }
}

impl DerefMut for ExecutionContextGuard<'_> {
  fn deref_mut(&mut self) -> &mut JsRuntime {
    self.rt
  }
}

impl Drop for ExecutionContextGuard<'_> {
  fn drop(&mut self) {
    if let Some(slot) = self.slot.take() {
      if let Err(err) = self.rt.vm.pop_execution_context(slot) {
        debug_assert!(false, "execution context guard failed to pop: {err}");
        tracing::error!(target: "realm_js::vm", %err, "execution context guard failed to pop");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Heap, JsRuntime};

  fn runtime() -> (JsRuntime, RealmId) {
    let mut rt = JsRuntime::new(VmOptions {
      max_stack_depth: 4,
      ..VmOptions::default()
    });
    let realm = rt.create_realm().unwrap();
    (rt, realm)
  }

  fn ctx(heap: &Heap, realm: RealmId) -> ExecutionContext {
    ExecutionContext::for_realm(heap, realm).unwrap()
  }

  #[test]
  fn push_and_pop_are_lifo() {
    let (mut rt, realm) = runtime();
    let c = ctx(&rt.heap, realm);
    let outer = rt.vm.push_execution_context(c).unwrap();
    let inner = rt.vm.push_execution_context(c).unwrap();
    assert_eq!(rt.vm.depth(), 2);
    assert!(matches!(
      rt.vm.pop_execution_context(outer),
      Err(VmError::InternalInvariantViolation(_))
    ));
    assert_eq!(rt.vm.depth(), 2);
    rt.vm.pop_execution_context(inner).unwrap();
    assert_eq!(rt.vm.current_realm(), Some(realm));
    rt.vm.pop_execution_context(StackSlot(0)).unwrap();
    assert!(rt.vm.running_execution_context().is_none());
    assert!(matches!(
      rt.vm.pop_execution_context(StackSlot(0)),
      Err(VmError::InternalInvariantViolation(_))
    ));
  }

  #[test]
  fn push_fails_beyond_the_depth_limit() {
    let (mut rt, realm) = runtime();
    let c = ctx(&rt.heap, realm);
    let mut slots = Vec::new();
    for _ in 0..4 {
      slots.push(rt.vm.push_execution_context(c).unwrap());
    }
    assert!(matches!(rt.vm.push_execution_context(c), Err(VmError::StackOverflow)));
    while let Some(slot) = slots.pop() {
      rt.vm.pop_execution_context(slot).unwrap();
    }
    assert_eq!(rt.vm.depth(), 0);
  }

  #[test]
  fn native_stack_is_measured_from_the_outermost_context() {
    let mut rt = JsRuntime::new(VmOptions {
      max_native_stack_bytes: 1024,
      ..VmOptions::default()
    });
    let realm = rt.create_realm().unwrap();
    let c = ctx(&rt.heap, realm);

    fn descend(vm: &Vm, remaining: usize) -> Result<(), VmError> {
      let padding = core::hint::black_box([0u8; 256]);
      vm.check_native_stack()?;
      if remaining == 0 {
        return Ok(());
      }
      let result = descend(vm, remaining - 1);
      core::hint::black_box(&padding);
      result
    }

    // Nothing is measured while the stack is empty.
    assert!(descend(&rt.vm, 64).is_ok());
    let slot = rt.vm.push_execution_context(c).unwrap();
    assert!(matches!(descend(&rt.vm, 64), Err(VmError::StackOverflow)));
    assert!(descend(&rt.vm, 0).is_ok());
    rt.vm.pop_execution_context(slot).unwrap();
    assert!(descend(&rt.vm, 64).is_ok());
  }

  #[test]
  fn guard_pops_on_drop_and_exit() {
    let (mut rt, realm) = runtime();
    let c = ctx(&rt.heap, realm);
    {
      let mut guard = rt.enter_execution_context(c).unwrap();
      assert_eq!(guard.vm.depth(), 1);
      let nested = guard.enter_execution_context(c).unwrap();
      assert_eq!(nested.vm.depth(), 2);
    }
    assert_eq!(rt.vm.depth(), 0);

    let guard = rt.enter_execution_context(c).unwrap();
    assert_eq!(guard.exit().unwrap(), c);
    assert_eq!(rt.vm.depth(), 0);
  }
}
