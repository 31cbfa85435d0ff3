//! Promise jobs, run from the microtask queue.

use crate::heap::{Trace, Tracer};
use crate::promise::{PromiseCapability, PromiseReaction, ReactionHandler, ReactionKind};
use crate::{GcObject, JsRuntime, Value, VmError};

/// A queued promise job.
#[derive(Debug)]
pub(crate) enum Job {
  /// `NewPromiseReactionJob(reaction, argument)`.
  PromiseReaction {
    reaction: PromiseReaction,
    argument: Value,
  },
  /// `NewPromiseResolveThenableJob(promise, thenable)` for a native thenable.
  PromiseResolveThenable { promise: GcObject, thenable: GcObject },
}

impl Job {
  pub(crate) fn name(&self) -> &'static str {
    match self {
      Job::PromiseReaction { .. } => "PromiseReactionJob",
      Job::PromiseResolveThenable { .. } => "PromiseResolveThenableJob",
    }
  }

  pub(crate) fn run(self, rt: &mut JsRuntime) -> Result<(), VmError> {
    match self {
      Job::PromiseReaction { reaction, argument } => run_reaction(rt, reaction, argument),
      Job::PromiseResolveThenable { promise, thenable } => {
        // Fresh resolving functions for `promise`, driven by the thenable's settlement.
        let capability = PromiseCapability::new(promise);
        rt.perform_promise_then_with(
          thenable,
          ReactionHandler::Empty,
          ReactionHandler::Empty,
          Some(capability),
        )
      }
    }
  }
}

impl Trace for Job {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    match self {
      Job::PromiseReaction { reaction, argument } => {
        reaction.trace(tracer);
        tracer.trace_value(*argument);
      }
      Job::PromiseResolveThenable { promise, thenable } => {
        tracer.trace_object(*promise);
        tracer.trace_object(*thenable);
      }
    }
  }
}

fn run_reaction(rt: &mut JsRuntime, reaction: PromiseReaction, argument: Value) -> Result<(), VmError> {
  let handler_result = match &reaction.handler {
    ReactionHandler::Empty => match reaction.kind {
      ReactionKind::Fulfill => Ok(argument),
      ReactionKind::Reject => Err(VmError::Throw(argument)),
    },
    ReactionHandler::Callback(callback) => rt.call(*callback, Value::Undefined, &[argument]),
    ReactionHandler::ExportGetter { export_name, realm } => {
      crate::shadow_realm::export_getter(rt, argument, export_name, *realm)
    }
    ReactionHandler::ImportRejection { realm } => {
      crate::shadow_realm::import_rejection(rt, argument, *realm)
    }
  };

  let Some(capability) = reaction.capability else {
    return handler_result.map(|_| ());
  };
  match handler_result {
    Ok(value) => capability.resolve(rt, value),
    Err(err) if err.is_catchable() => {
      let realm = rt.heap.promise_realm(capability.promise)?;
      let reason = rt.error_to_value(err, realm)?;
      capability.reject(rt, reason)
    }
    Err(err) => Err(err),
  }
}
