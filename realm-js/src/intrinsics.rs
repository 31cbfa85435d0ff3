use crate::error_object::NativeErrorKind;
use crate::heap::{Trace, Tracer};
use crate::property::PropertyDescriptor;
use crate::{GcObject, Heap, Value, VmError};

/// The intrinsic objects of one realm.
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
  pub object_prototype: GcObject,
  pub function_prototype: GcObject,
  pub error_prototype: GcObject,
  pub type_error_prototype: GcObject,
  pub syntax_error_prototype: GcObject,
  pub reference_error_prototype: GcObject,
  pub range_error_prototype: GcObject,
  pub promise_prototype: GcObject,
  pub shadow_realm_prototype: GcObject,
}

impl Intrinsics {
  /// Allocates the prototype objects. Methods are installed once the realm record exists.
  pub(crate) fn alloc(heap: &mut Heap) -> Result<Self, VmError> {
    let object_prototype = heap.alloc_object(None)?;
    let function_prototype = heap.alloc_object(Some(object_prototype))?;
    let error_prototype = heap.alloc_object(Some(object_prototype))?;
    let native_error_prototype = |heap: &mut Heap| heap.alloc_object(Some(error_prototype));
    let intrinsics = Self {
      object_prototype,
      function_prototype,
      error_prototype,
      type_error_prototype: native_error_prototype(heap)?,
      syntax_error_prototype: native_error_prototype(heap)?,
      reference_error_prototype: native_error_prototype(heap)?,
      range_error_prototype: native_error_prototype(heap)?,
      promise_prototype: heap.alloc_object(Some(object_prototype))?,
      shadow_realm_prototype: heap.alloc_object(Some(object_prototype))?,
    };

    for kind in NativeErrorKind::ALL {
      let proto = intrinsics.error_prototype(kind);
      let name = heap.alloc_string(kind.name())?;
      heap.define_own_property(proto, "name", PropertyDescriptor::hidden(Value::String(name)))?;
      let message = heap.alloc_string("")?;
      heap.define_own_property(proto, "message", PropertyDescriptor::hidden(Value::String(message)))?;
    }
    Ok(intrinsics)
  }

  pub fn error_prototype(&self, kind: NativeErrorKind) -> GcObject {
    match kind {
      NativeErrorKind::Error => self.error_prototype,
      NativeErrorKind::TypeError => self.type_error_prototype,
      NativeErrorKind::SyntaxError => self.syntax_error_prototype,
      NativeErrorKind::ReferenceError => self.reference_error_prototype,
      NativeErrorKind::RangeError => self.range_error_prototype,
    }
  }
}

impl Trace for Intrinsics {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    for obj in [
      self.object_prototype,
      self.function_prototype,
      self.error_prototype,
      self.type_error_prototype,
      self.syntax_error_prototype,
      self.reference_error_prototype,
      self.range_error_prototype,
      self.promise_prototype,
      self.shadow_realm_prototype,
    ] {
      tracer.trace_object(obj);
    }
  }
}
