//! Promises: state, reactions, resolution and `Promise.prototype.then`.
//!
//! Only native promises are adopted when resolving; any other object fulfills the promise as a
//! plain value.

use crate::function::NativeCall;
use crate::heap::{HeapObject, ObjectBase, Trace, Tracer};
use crate::jobs::Job;
use crate::{GcObject, Heap, JsRuntime, RealmId, Value, VmError};
use core::mem;
use std::cell::Cell;
use std::rc::Rc;

/// `[[PromiseState]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
  Pending,
  Fulfilled,
  Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReactionKind {
  Fulfill,
  Reject,
}

/// What runs when a reaction fires.
#[derive(Debug, Clone)]
pub(crate) enum ReactionHandler {
  /// Pass the argument through (fulfill) or rethrow it (reject).
  Empty,
  /// A script callable.
  Callback(Value),
  /// Reads `export_name` from a module namespace and wraps it into `realm`.
  ExportGetter { export_name: Rc<str>, realm: RealmId },
  /// Re-homes an import failure as a `TypeError` of `realm`.
  ImportRejection { realm: RealmId },
}

impl ReactionHandler {
  fn from_callback(heap: &Heap, value: Value) -> Self {
    if heap.is_callable(value) {
      ReactionHandler::Callback(value)
    } else {
      ReactionHandler::Empty
    }
  }
}

/// `PromiseReaction` record.
#[derive(Debug, Clone)]
pub(crate) struct PromiseReaction {
  pub(crate) capability: Option<PromiseCapability>,
  pub(crate) kind: ReactionKind,
  pub(crate) handler: ReactionHandler,
}

impl Trace for PromiseReaction {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Some(capability) = &self.capability {
      tracer.trace_object(capability.promise);
    }
    match &self.handler {
      ReactionHandler::Empty => {}
      ReactionHandler::Callback(value) => tracer.trace_value(*value),
      ReactionHandler::ExportGetter { realm, .. } | ReactionHandler::ImportRejection { realm } => {
        tracer.trace_realm(*realm)
      }
    }
  }
}

#[derive(Debug)]
pub(crate) struct JsPromise {
  pub(crate) base: ObjectBase,
  pub(crate) realm: RealmId,
  pub(crate) state: PromiseState,
  pub(crate) result: Value,
  pub(crate) fulfill_reactions: Vec<PromiseReaction>,
  pub(crate) reject_reactions: Vec<PromiseReaction>,
}

impl JsPromise {
  pub(crate) fn heap_size_bytes(&self) -> usize {
    let reactions = self.fulfill_reactions.len() + self.reject_reactions.len();
    self
      .base
      .heap_size_bytes()
      .saturating_add(reactions.saturating_mul(mem::size_of::<PromiseReaction>()))
  }
}

impl Trace for JsPromise {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    self.base.trace(tracer);
    tracer.trace_realm(self.realm);
    tracer.trace_value(self.result);
    for reaction in self.fulfill_reactions.iter().chain(&self.reject_reactions) {
      reaction.trace(tracer);
    }
  }
}

/// A promise together with its resolving functions.
///
/// Clones share the "already resolved" flag, so the promise settles at most once however many
/// clones try.
#[derive(Debug, Clone)]
pub struct PromiseCapability {
  pub promise: GcObject,
  already_resolved: Rc<Cell<bool>>,
}

impl PromiseCapability {
  pub(crate) fn new(promise: GcObject) -> Self {
    Self {
      promise,
      already_resolved: Rc::new(Cell::new(false)),
    }
  }

  pub fn is_resolved(&self) -> bool {
    self.already_resolved.get()
  }

  /// The `resolve` function: adopts the state of a native promise, fulfills otherwise.
  pub fn resolve(&self, rt: &mut JsRuntime, resolution: Value) -> Result<(), VmError> {
    if self.already_resolved.replace(true) {
      return Ok(());
    }
    if resolution == Value::Object(self.promise) {
      let realm = rt.heap.promise_realm(self.promise)?;
      let err = rt.create_error(
        realm,
        crate::NativeErrorKind::TypeError,
        "Chaining cycle detected for promise",
      )?;
      return rt.reject_promise(self.promise, Value::Object(err));
    }
    if let Value::Object(thenable) = resolution {
      if rt.heap.get_promise(thenable).is_ok() {
        rt.microtasks.enqueue(Job::PromiseResolveThenable {
          promise: self.promise,
          thenable,
        });
        return Ok(());
      }
    }
    rt.fulfill_promise(self.promise, resolution)
  }

  /// The `reject` function.
  pub fn reject(&self, rt: &mut JsRuntime, reason: Value) -> Result<(), VmError> {
    if self.already_resolved.replace(true) {
      return Ok(());
    }
    rt.reject_promise(self.promise, reason)
  }
}

impl Heap {
  pub(crate) fn alloc_promise(&mut self, realm: RealmId) -> Result<GcObject, VmError> {
    let prototype = self.realm_intrinsics(realm)?.promise_prototype;
    let promise = JsPromise {
      base: ObjectBase::new(Some(prototype)),
      realm,
      state: PromiseState::Pending,
      result: Value::Undefined,
      fulfill_reactions: Vec::new(),
      reject_reactions: Vec::new(),
    };
    Ok(GcObject(self.alloc(HeapObject::Promise(promise))?))
  }

  pub fn is_promise(&self, obj: GcObject) -> bool {
    self.get_promise(obj).is_ok()
  }

  pub fn promise_state(&self, promise: GcObject) -> Result<PromiseState, VmError> {
    Ok(self.get_promise(promise)?.state)
  }

  /// `[[PromiseResult]]`: `undefined` while pending.
  pub fn promise_result(&self, promise: GcObject) -> Result<Value, VmError> {
    Ok(self.get_promise(promise)?.result)
  }

  pub(crate) fn promise_realm(&self, promise: GcObject) -> Result<RealmId, VmError> {
    Ok(self.get_promise(promise)?.realm)
  }
}

impl JsRuntime {
  /// `NewPromiseCapability(%Promise%)` for the intrinsic constructor of `realm`.
  pub fn new_promise_capability(&mut self, realm: RealmId) -> Result<PromiseCapability, VmError> {
    Ok(PromiseCapability::new(self.heap.alloc_promise(realm)?))
  }

  /// `PerformPromiseThen(promise, onFulfilled, onRejected, resultCapability)`. Non-callable
  /// handlers pass the settlement through.
  pub fn perform_promise_then(
    &mut self,
    promise: GcObject,
    on_fulfilled: Value,
    on_rejected: Value,
    capability: Option<PromiseCapability>,
  ) -> Result<(), VmError> {
    let on_fulfilled = ReactionHandler::from_callback(&self.heap, on_fulfilled);
    let on_rejected = ReactionHandler::from_callback(&self.heap, on_rejected);
    self.perform_promise_then_with(promise, on_fulfilled, on_rejected, capability)
  }

  pub(crate) fn perform_promise_then_with(
    &mut self,
    promise: GcObject,
    on_fulfilled: ReactionHandler,
    on_rejected: ReactionHandler,
    capability: Option<PromiseCapability>,
  ) -> Result<(), VmError> {
    let fulfill = PromiseReaction {
      capability: capability.clone(),
      kind: ReactionKind::Fulfill,
      handler: on_fulfilled,
    };
    let reject = PromiseReaction {
      capability,
      kind: ReactionKind::Reject,
      handler: on_rejected,
    };

    let (state, result) = {
      let p = self.heap.get_promise(promise)?;
      (p.state, p.result)
    };
    match state {
      PromiseState::Pending => {
        self.heap.ensure_can_allocate(2 * mem::size_of::<PromiseReaction>())?;
        let p = self.heap.get_promise_mut(promise)?;
        p.fulfill_reactions.push(fulfill);
        p.reject_reactions.push(reject);
        self.heap.refresh_slot_bytes(promise.0);
      }
      PromiseState::Fulfilled => self.microtasks.enqueue(Job::PromiseReaction {
        reaction: fulfill,
        argument: result,
      }),
      PromiseState::Rejected => self.microtasks.enqueue(Job::PromiseReaction {
        reaction: reject,
        argument: result,
      }),
    }
    Ok(())
  }

  fn fulfill_promise(&mut self, promise: GcObject, value: Value) -> Result<(), VmError> {
    self.settle_promise(promise, PromiseState::Fulfilled, value)
  }

  fn reject_promise(&mut self, promise: GcObject, reason: Value) -> Result<(), VmError> {
    self.settle_promise(promise, PromiseState::Rejected, reason)
  }

  /// Settles a pending promise and schedules the matching reactions (`TriggerPromiseReactions`).
  fn settle_promise(
    &mut self,
    promise: GcObject,
    state: PromiseState,
    result: Value,
  ) -> Result<(), VmError> {
    let p = self.heap.get_promise_mut(promise)?;
    if p.state != PromiseState::Pending {
      return Err(VmError::InternalInvariantViolation("settling a settled promise"));
    }
    p.state = state;
    p.result = result;
    let fulfill = mem::take(&mut p.fulfill_reactions);
    let reject = mem::take(&mut p.reject_reactions);
    self.heap.refresh_slot_bytes(promise.0);

    let reactions = if state == PromiseState::Fulfilled { fulfill } else { reject };
    for reaction in reactions {
      self.microtasks.enqueue(Job::PromiseReaction {
        reaction,
        argument: result,
      });
    }
    Ok(())
  }
}

/// `Promise.prototype.then(onFulfilled, onRejected)`.
pub(crate) fn promise_prototype_then(rt: &mut JsRuntime, call: &NativeCall) -> Result<Value, VmError> {
  let promise = match call.this {
    Value::Object(obj) if rt.heap.is_promise(obj) => obj,
    _ => {
      return Err(VmError::TypeError(
        "Promise.prototype.then called on an incompatible receiver".to_string(),
      ))
    }
  };
  let realm = rt.heap.function_realm(call.callee)?;
  let capability = rt.new_promise_capability(realm)?;
  let result = capability.promise;
  rt.perform_promise_then(promise, call.arg(0), call.arg(1), Some(capability))?;
  Ok(Value::Object(result))
}
