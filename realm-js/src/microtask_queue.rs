//! The FIFO microtask queue and microtask checkpoints.

use crate::heap::{Trace, Tracer};
use crate::jobs::Job;
use crate::{JsRuntime, VmError};
use std::collections::VecDeque;

/// Queued promise jobs, run in FIFO order. Queued jobs are GC roots.
#[derive(Debug, Default)]
pub struct MicrotaskQueue {
  queue: VecDeque<Job>,
  performing_checkpoint: bool,
}

impl MicrotaskQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn enqueue(&mut self, job: Job) {
    tracing::trace!(target: "realm_js::jobs", job = job.name(), queued = self.queue.len() + 1, "job enqueued");
    self.queue.push_back(job);
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }
}

impl Trace for MicrotaskQueue {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    for job in &self.queue {
      job.trace(tracer);
    }
  }
}

impl JsRuntime {
  /// Number of jobs waiting for the next checkpoint.
  pub fn pending_jobs(&self) -> usize {
    self.microtasks.len()
  }

  /// Runs queued jobs until the queue is empty, including jobs enqueued while running.
  ///
  /// A failing job does not stop the checkpoint; its error is returned for the host to report.
  /// When the execution context stack is empty and the heap is over its GC threshold, a collection
  /// runs afterwards. A nested call while a checkpoint is in progress does nothing.
  pub fn perform_microtask_checkpoint(&mut self) -> Vec<VmError> {
    let mut errors = Vec::new();
    if self.microtasks.performing_checkpoint {
      return errors;
    }
    self.microtasks.performing_checkpoint = true;

    while let Some(job) = self.microtasks.queue.pop_front() {
      let name = job.name();
      tracing::trace!(target: "realm_js::jobs", job = name, "running job");
      if let Err(err) = job.run(self) {
        tracing::debug!(target: "realm_js::jobs", job = name, %err, "job failed");
        errors.push(err);
      }
    }

    self.microtasks.performing_checkpoint = false;
    if self.vm.depth() == 0 && self.heap.over_gc_threshold() {
      self.collect_garbage();
    }
    errors
  }
}
