//! Cross-realm execution core for `ecma-rs`.
//!
//! A [`JsRuntime`] hosts any number of realms (each with its own intrinsics, global object and
//! global environment) on a single execution context stack. On top of that it provides:
//! - `ShadowRealm`-style evaluation of source text in another realm ([`JsRuntime::evaluate`])
//! - Callable-only value marshalling across realms ([`JsRuntime::wrap`])
//! - The asynchronous import bridge ([`JsRuntime::import_value`]), completed by a host
//!   [`ModuleLoader`] and driven by microtask checkpoints
//! - Explicit GC edges between heap values and realms ([`Heap::register_edge`])
//!
//! # Execution contexts
//!
//! Every push onto the context stack yields a [`StackSlot`] that must be handed back to the
//! matching pop; most code uses [`ExecutionContextGuard`] instead. Whatever way an operation ends,
//! the stack depth afterwards equals the depth before.
//!
//! # Garbage collection
//!
//! Allocation never collects. A cycle runs only on [`JsRuntime::collect_garbage`] or at the end of
//! a microtask checkpoint with an empty context stack, tracing from persistent roots, the context
//! stack, queued jobs and registered edges.

mod completion;
mod declarations;
mod env;
mod error;
mod error_object;
mod exec;
mod execution_context;
mod function;
mod handle;
mod heap;
mod intrinsics;
mod jobs;
mod microtask_queue;
mod module_loading;
mod ops;
mod promise;
mod property;
mod realm;
mod shadow_realm;
mod static_semantics;
mod string;
mod value;
mod vm;

pub use crate::completion::Completion;
pub use crate::env::BindingRef;
pub use crate::error::VmError;
pub use crate::error_object::NativeErrorKind;
pub use crate::exec::JsRuntime;
pub use crate::execution_context::ExecutionContext;
pub use crate::function::NativeCall;
pub use crate::function::NativeFunction;
pub use crate::function::ThisMode;
pub use crate::handle::GcEnv;
pub use crate::handle::GcObject;
pub use crate::handle::GcRef;
pub use crate::handle::GcString;
pub use crate::handle::HeapId;
pub use crate::handle::RealmId;
pub use crate::handle::RootId;
pub use crate::heap::Heap;
pub use crate::heap::HeapLimits;
pub use crate::heap::Trace;
pub use crate::heap::Tracer;
pub use crate::heap::MAX_PROTOTYPE_CHAIN;
pub use crate::intrinsics::Intrinsics;
pub use crate::microtask_queue::MicrotaskQueue;
pub use crate::module_loading::ModuleLoadRequest;
pub use crate::module_loading::ModuleLoader;
pub use crate::ops::loose_equal;
pub use crate::ops::number_to_string;
pub use crate::ops::strict_equal;
pub use crate::ops::to_boolean;
pub use crate::ops::to_number;
pub use crate::ops::to_rust_string;
pub use crate::ops::to_string;
pub use crate::ops::type_of;
pub use crate::promise::PromiseCapability;
pub use crate::promise::PromiseState;
pub use crate::property::PropertyDescriptor;
pub use crate::string::JsString;
pub use crate::value::Value;
pub use crate::vm::ExecutionContextGuard;
pub use crate::vm::StackSlot;
pub use crate::vm::Vm;
pub use crate::vm::VmOptions;
