//! Host hooks for dynamic module loading.
//!
//! The runtime does not load modules itself. A dynamic import hands the host a
//! [`ModuleLoadRequest`] through [`ModuleLoader::host_import_module_dynamically`]; the host later
//! completes it, synchronously or not, with [`JsRuntime::finish_dynamic_import`], passing either a
//! module namespace object (see [`Heap::create_module_namespace`]) or a rejection reason.
//!
//! - `HostLoadImportedModule` / `FinishLoadingImportedModule`:
//!   <https://tc39.es/ecma262/#sec-hostloadimportedmodule>

use crate::heap::ObjectClass;
use crate::promise::PromiseCapability;
use crate::property::PropertyDescriptor;
use crate::{GcObject, Heap, JsRuntime, NativeErrorKind, RealmId, RootId, Value, VmError};

/// Host-provided module loading.
pub trait ModuleLoader {
  /// Starts loading `request.specifier`. The host must eventually pass `request` to
  /// [`JsRuntime::finish_dynamic_import`]; until then the pending promise stays rooted.
  fn host_import_module_dynamically(&mut self, request: ModuleLoadRequest);
}

/// An in-flight dynamic import.
#[derive(Debug)]
pub struct ModuleLoadRequest {
  pub specifier: String,
  /// Realm of the execution context that was running when the import started.
  pub referrer: RealmId,
  capability: PromiseCapability,
  root: RootId,
}

impl ModuleLoadRequest {
  /// The promise the import settles.
  pub fn promise(&self) -> GcObject {
    self.capability.promise
  }
}

impl Heap {
  /// Allocates a module namespace exotic object: null prototype, non-extensible, with one
  /// enumerable, non-writable, non-configurable property per export.
  pub fn create_module_namespace(&mut self, exports: &[(&str, Value)]) -> Result<GcObject, VmError> {
    let namespace = self.alloc_object_with_class(None, ObjectClass::ModuleNamespace)?;
    for (name, value) in exports {
      self.define_own_property_or_throw(namespace, name, PropertyDescriptor::frozen(*value, true))?;
    }
    self.object_set_extensible(namespace, false)?;
    Ok(namespace)
  }
}

impl JsRuntime {
  pub fn set_module_loader(&mut self, loader: Box<dyn ModuleLoader>) {
    self.module_loader = Some(loader);
  }

  /// `HostLoadImportedModule` for a dynamic import settling `capability`.
  ///
  /// Without a module loader the import is rejected with a `TypeError` of the running realm.
  pub(crate) fn host_import_module_dynamically(
    &mut self,
    specifier: &str,
    capability: PromiseCapability,
  ) -> Result<(), VmError> {
    let referrer = self.vm.current_realm().ok_or(VmError::InternalInvariantViolation(
      "dynamic import without a running execution context",
    ))?;

    let Some(loader) = self.module_loader.as_mut() else {
      let err = self.create_error(
        referrer,
        NativeErrorKind::TypeError,
        &format!("Cannot import '{specifier}': no module loader is installed"),
      )?;
      return capability.reject(self, Value::Object(err));
    };

    let root = self.heap.add_root(Value::Object(capability.promise));
    tracing::debug!(target: "realm_js::vm", specifier, ?referrer, "dynamic import requested");
    loader.host_import_module_dynamically(ModuleLoadRequest {
      specifier: specifier.to_string(),
      referrer,
      capability,
      root,
    });
    Ok(())
  }

  /// `FinishLoadingImportedModule` + `ContinueDynamicImport`: settles the import's promise with
  /// the loaded namespace or the failure reason.
  pub fn finish_dynamic_import(
    &mut self,
    request: ModuleLoadRequest,
    result: Result<GcObject, Value>,
  ) -> Result<(), VmError> {
    let ModuleLoadRequest {
      specifier,
      capability,
      root,
      ..
    } = request;
    self.heap.remove_root(root);
    tracing::debug!(target: "realm_js::vm", %specifier, ok = result.is_ok(), "dynamic import finished");
    match result {
      Ok(namespace) => capability.resolve(self, Value::Object(namespace)),
      Err(reason) => capability.reject(self, reason),
    }
  }
}
