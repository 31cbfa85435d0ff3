use crate::env::EnvRecord;
use crate::error_object::NativeErrorKind;
use crate::execution_context::ExecutionContext;
use crate::function::JsFunction;
use crate::handle::GcRef;
use crate::promise::JsPromise;
use crate::property::PropertyDescriptor;
use crate::realm::RealmRecord;
use crate::string::JsString;
use crate::{GcEnv, GcObject, GcString, HeapId, RealmId, RootId, Value, VmError};
use ahash::HashMap;
use ahash::HashMapExt;
use core::mem;

/// Hard upper bound for `[[Prototype]]` chain traversals.
pub const MAX_PROTOTYPE_CHAIN: usize = 10_000;

/// Heap configuration and memory limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapLimits {
  /// Hard memory limit for live heap allocations, in bytes. Allocations beyond it fail with
  /// [`VmError::OutOfMemory`].
  pub max_bytes: usize,
  /// Once `used_bytes` exceeds this threshold, the runtime collects at its next safe point.
  pub gc_threshold: usize,
}

impl HeapLimits {
  pub fn new(max_bytes: usize, gc_threshold: usize) -> Self {
    Self {
      max_bytes,
      gc_threshold,
    }
  }
}

impl Default for HeapLimits {
  fn default() -> Self {
    Self::new(64 * 1024 * 1024, 16 * 1024 * 1024)
  }
}

/// A non-moving mark/sweep GC heap.
///
/// Allocations live in index-addressed slots and are referenced by `{index, generation}` handles,
/// so stale handles are detected ([`VmError::InvalidHandle`]) instead of aliasing newer
/// allocations.
///
/// Allocation never collects. Collection only happens when explicitly requested, with the caller
/// supplying every root set beyond the heap's own persistent roots and registered edges (see
/// [`crate::JsRuntime::collect_garbage`]). Handles held only in Rust locals are not roots.
pub struct Heap {
  limits: HeapLimits,

  used_bytes: usize,
  gc_runs: u64,

  slots: Vec<Slot>,
  marks: Vec<u8>,
  free_list: Vec<u32>,

  persistent_roots: Vec<Option<Value>>,
  persistent_roots_free: Vec<u32>,

  // Side table of holder -> targets, traced while the holder is live.
  edges: HashMap<HeapId, Vec<GcRef>>,
}

impl Heap {
  pub fn new(limits: HeapLimits) -> Self {
    Self {
      limits,
      used_bytes: 0,
      gc_runs: 0,
      slots: Vec::new(),
      marks: Vec::new(),
      free_list: Vec::new(),
      persistent_roots: Vec::new(),
      persistent_roots_free: Vec::new(),
      edges: HashMap::new(),
    }
  }

  pub fn limits(&self) -> HeapLimits {
    self.limits
  }

  /// Bytes used by live allocations.
  pub fn used_bytes(&self) -> usize {
    self.used_bytes
  }

  pub fn gc_runs(&self) -> u64 {
    self.gc_runs
  }

  /// Number of occupied slots.
  pub fn live_allocations(&self) -> usize {
    self.slots.iter().filter(|slot| slot.value.is_some()).count()
  }

  pub(crate) fn over_gc_threshold(&self) -> bool {
    self.used_bytes > self.limits.gc_threshold
  }

  /// Runs a GC cycle, treating `extra_roots` as additional root sets.
  pub fn collect_garbage_with(&mut self, extra_roots: &[&dyn Trace]) {
    self.gc_runs += 1;
    let before = self.used_bytes;

    // Mark.
    {
      debug_assert_eq!(self.slots.len(), self.marks.len());

      let slots = &self.slots;
      let edges = &self.edges;
      let marks = &mut self.marks[..];

      let mut tracer = Tracer::new(slots, marks);
      for value in self.persistent_roots.iter().flatten() {
        tracer.trace_value(*value);
      }
      for root in extra_roots {
        root.trace(&mut tracer);
      }

      while let Some(id) = tracer.pop_work() {
        let Some(idx) = tracer.validate(id) else {
          continue;
        };
        if tracer.marks[idx] != 0 {
          continue;
        }
        tracer.marks[idx] = 1;

        let Some(obj) = tracer.slots[idx].value.as_ref() else {
          debug_assert!(false, "validated heap id points to a free slot: {id:?}");
          continue;
        };
        obj.trace(&mut tracer);
        if let Some(targets) = edges.get(&id) {
          for target in targets {
            tracer.trace_ref(*target);
          }
        }
      }
    }

    // Sweep.
    let mut freed = 0usize;
    for (idx, slot) in self.slots.iter_mut().enumerate() {
      let marked = self.marks[idx] != 0;
      self.marks[idx] = 0;

      if slot.value.is_none() || marked {
        continue;
      }

      self.used_bytes = self.used_bytes.saturating_sub(slot.bytes);
      slot.value = None;
      slot.bytes = 0;
      slot.generation = slot.generation.wrapping_add(1);
      self.free_list.push(idx as u32);
      freed += 1;
    }

    // Edges die with their holder. Targets of a live holder were marked through it.
    let slots = &self.slots;
    self
      .edges
      .retain(|holder, _| validate_slot(slots, *holder).is_some());

    tracing::debug!(
      target: "realm_js::gc",
      run = self.gc_runs,
      freed,
      bytes_before = before,
      bytes_after = self.used_bytes,
      "garbage collection finished"
    );
  }

  /// Records that `holder` keeps `target` alive.
  ///
  /// The edge is traced for as long as `holder` is live and is dropped when `holder` is collected.
  /// Registering the same edge twice is a no-op.
  pub fn register_edge(
    &mut self,
    holder: impl Into<GcRef>,
    target: impl Into<GcRef>,
  ) -> Result<(), VmError> {
    let holder = holder.into();
    let target = target.into();
    let Some(holder_id) = holder.heap_id() else {
      return Err(VmError::InternalInvariantViolation(
        "GC edge holder must be a heap allocation",
      ));
    };
    self.validate(holder_id).ok_or(VmError::InvalidHandle)?;
    let Some(target_id) = target.heap_id() else {
      // Primitives need no edge.
      return Ok(());
    };
    self.validate(target_id).ok_or(VmError::InvalidHandle)?;

    let targets = self.edges.entry(holder_id).or_default();
    if !targets.contains(&target) {
      targets.push(target);
      tracing::trace!(target: "realm_js::gc", holder = ?holder_id, target = ?target_id, "edge registered");
    }
    Ok(())
  }

  /// Number of edges registered for `holder`.
  pub fn edge_count(&self, holder: impl Into<GcRef>) -> usize {
    holder
      .into()
      .heap_id()
      .and_then(|id| self.edges.get(&id))
      .map_or(0, Vec::len)
  }

  /// Adds a persistent root, keeping `value` live until the returned [`RootId`] is removed.
  pub fn add_root(&mut self, value: Value) -> RootId {
    debug_assert!(self.is_valid_value(value));

    let idx = match self.persistent_roots_free.pop() {
      Some(idx) => idx as usize,
      None => {
        self.persistent_roots.push(None);
        self.persistent_roots.len() - 1
      }
    };
    self.persistent_roots[idx] = Some(value);
    RootId(idx as u32)
  }

  pub fn get_root(&self, id: RootId) -> Option<Value> {
    self
      .persistent_roots
      .get(id.0 as usize)
      .and_then(|slot| *slot)
  }

  pub fn remove_root(&mut self, id: RootId) {
    let idx = id.0 as usize;
    debug_assert!(idx < self.persistent_roots.len(), "invalid RootId");
    if let Some(slot) = self.persistent_roots.get_mut(idx) {
      if slot.take().is_some() {
        self.persistent_roots_free.push(id.0);
      }
    }
  }

  pub fn is_valid_object(&self, obj: GcObject) -> bool {
    matches!(
      self.get_heap_object(obj.0),
      Ok(HeapObject::Object(_) | HeapObject::Function(_) | HeapObject::Promise(_))
    )
  }

  pub fn is_valid_string(&self, s: GcString) -> bool {
    matches!(self.get_heap_object(s.0), Ok(HeapObject::String(_)))
  }

  pub fn is_valid_env(&self, env: GcEnv) -> bool {
    matches!(self.get_heap_object(env.0), Ok(HeapObject::Env(_)))
  }

  pub fn is_valid_realm(&self, realm: RealmId) -> bool {
    matches!(self.get_heap_object(realm.0), Ok(HeapObject::Realm(_)))
  }

  fn is_valid_value(&self, value: Value) -> bool {
    match value {
      Value::String(s) => self.is_valid_string(s),
      Value::Object(o) => self.is_valid_object(o),
      _ => true,
    }
  }

  pub fn alloc_string(&mut self, s: &str) -> Result<GcString, VmError> {
    let bytes = JsString::heap_size_bytes_for_len(s.len());
    self.ensure_can_allocate(bytes)?;
    let id = self.alloc_unchecked(HeapObject::String(JsString::from_str(s)), bytes);
    Ok(GcString(id))
  }

  pub fn get_string(&self, s: GcString) -> Result<&JsString, VmError> {
    match self.get_heap_object(s.0)? {
      HeapObject::String(s) => Ok(s),
      _ => Err(VmError::InvalidHandle),
    }
  }

  /// Allocates an ordinary object with the given prototype.
  pub fn alloc_object(&mut self, prototype: Option<GcObject>) -> Result<GcObject, VmError> {
    self.alloc_object_with_class(prototype, ObjectClass::Ordinary)
  }

  pub(crate) fn alloc_object_with_class(
    &mut self,
    prototype: Option<GcObject>,
    class: ObjectClass,
  ) -> Result<GcObject, VmError> {
    let obj = HeapObject::Object(JsObject {
      base: ObjectBase::new(prototype),
      class,
    });
    Ok(GcObject(self.alloc(obj)?))
  }

  pub(crate) fn object_class(&self, obj: GcObject) -> Result<&ObjectClass, VmError> {
    match self.get_heap_object(obj.0)? {
      HeapObject::Object(o) => Ok(&o.class),
      HeapObject::Function(_) | HeapObject::Promise(_) => Ok(&ObjectClass::Ordinary),
      _ => Err(VmError::InvalidHandle),
    }
  }

  /// The error kind of an error object created by [`crate::JsRuntime::create_error`].
  pub fn error_kind(&self, obj: GcObject) -> Result<Option<NativeErrorKind>, VmError> {
    Ok(match self.object_class(obj)? {
      ObjectClass::Error(kind) => Some(*kind),
      _ => None,
    })
  }

  pub fn is_module_namespace(&self, obj: GcObject) -> Result<bool, VmError> {
    Ok(matches!(self.object_class(obj)?, ObjectClass::ModuleNamespace))
  }

  /// The realm created for a ShadowRealm object, or `None` for any other object.
  pub fn shadow_realm_target(&self, obj: GcObject) -> Result<Option<RealmId>, VmError> {
    Ok(self.shadow_realm_record(obj)?.map(|(realm, _)| realm))
  }

  pub(crate) fn shadow_realm_record(
    &self,
    obj: GcObject,
  ) -> Result<Option<(RealmId, ExecutionContext)>, VmError> {
    Ok(match self.object_class(obj)? {
      ObjectClass::ShadowRealm { realm, context } => Some((*realm, *context)),
      _ => None,
    })
  }

  pub fn is_callable(&self, value: Value) -> bool {
    match value {
      Value::Object(obj) => matches!(self.get_heap_object(obj.0), Ok(HeapObject::Function(_))),
      _ => false,
    }
  }

  pub fn is_constructor(&self, value: Value) -> bool {
    match value {
      Value::Object(obj) => self
        .get_function(obj)
        .map(|f| f.constructable)
        .unwrap_or(false),
      _ => false,
    }
  }

  pub fn object_prototype(&self, obj: GcObject) -> Result<Option<GcObject>, VmError> {
    Ok(self.get_object_base(obj)?.prototype)
  }

  pub fn object_set_extensible(&mut self, obj: GcObject, extensible: bool) -> Result<(), VmError> {
    self.get_object_base_mut(obj)?.extensible = extensible;
    Ok(())
  }

  pub fn get_own_property(
    &self,
    obj: GcObject,
    key: &str,
  ) -> Result<Option<PropertyDescriptor>, VmError> {
    Ok(self.get_object_base(obj)?.find(key).map(|entry| entry.desc))
  }

  pub fn has_own_property(&self, obj: GcObject, key: &str) -> Result<bool, VmError> {
    Ok(self.get_own_property(obj, key)?.is_some())
  }

  pub fn has_property(&self, obj: GcObject, key: &str) -> Result<bool, VmError> {
    Ok(self.get_property(obj, key)?.is_some())
  }

  /// Looks `key` up along the prototype chain.
  pub fn get_property(
    &self,
    obj: GcObject,
    key: &str,
  ) -> Result<Option<PropertyDescriptor>, VmError> {
    let mut current = Some(obj);
    let mut steps = 0usize;
    while let Some(obj) = current {
      if steps >= MAX_PROTOTYPE_CHAIN {
        return Err(VmError::RangeError("prototype chain too deep".to_string()));
      }
      steps += 1;
      let base = self.get_object_base(obj)?;
      if let Some(entry) = base.find(key) {
        return Ok(Some(entry.desc));
      }
      current = base.prototype;
    }
    Ok(None)
  }

  /// `[[Get]]` for data properties: `undefined` when absent.
  pub fn get(&self, obj: GcObject, key: &str) -> Result<Value, VmError> {
    Ok(
      self
        .get_property(obj, key)?
        .map_or(Value::Undefined, |desc| desc.value),
    )
  }

  /// `[[Set]]` with the object itself as receiver. Returns `false` when the assignment was
  /// rejected (non-writable or non-extensible).
  pub fn set(&mut self, obj: GcObject, key: &str, value: Value) -> Result<bool, VmError> {
    if let Some(entry) = self.get_object_base_mut(obj)?.find_mut(key) {
      if !entry.desc.writable {
        return Ok(false);
      }
      entry.desc.value = value;
      return Ok(true);
    }
    if let Some(proto) = self.object_prototype(obj)? {
      if let Some(inherited) = self.get_property(proto, key)? {
        if !inherited.writable {
          return Ok(false);
        }
      }
    }
    self.define_own_property(obj, key, PropertyDescriptor::data(value))
  }

  /// Like [`Heap::set`], but a rejected assignment is a `TypeError`.
  pub fn set_or_throw(&mut self, obj: GcObject, key: &str, value: Value) -> Result<(), VmError> {
    if self.set(obj, key, value)? {
      Ok(())
    } else {
      Err(VmError::TypeError(format!(
        "Cannot assign to read only property '{key}' of object"
      )))
    }
  }

  /// `[[DefineOwnProperty]]` for data descriptors. Returns `false` when the definition is not
  /// allowed (non-configurable existing property, or a new property on a non-extensible object).
  pub fn define_own_property(
    &mut self,
    obj: GcObject,
    key: &str,
    desc: PropertyDescriptor,
  ) -> Result<bool, VmError> {
    let base = self.get_object_base_mut(obj)?;
    if let Some(entry) = base.find_mut(key) {
      let current = entry.desc;
      if !current.configurable {
        let compatible = !desc.configurable
          && desc.enumerable == current.enumerable
          && (current.writable || (!desc.writable && desc.value == current.value));
        if !compatible {
          return Ok(false);
        }
      }
      entry.desc = desc;
      return Ok(true);
    }
    if !base.extensible {
      return Ok(false);
    }

    let entry_bytes = PropertyEntry::heap_size_bytes_for_key(key);
    self.ensure_can_allocate(entry_bytes)?;
    self.get_object_base_mut(obj)?.properties.push(PropertyEntry {
      key: key.into(),
      desc,
    });
    self.refresh_slot_bytes(obj.0);
    Ok(true)
  }

  pub fn define_own_property_or_throw(
    &mut self,
    obj: GcObject,
    key: &str,
    desc: PropertyDescriptor,
  ) -> Result<(), VmError> {
    if self.define_own_property(obj, key, desc)? {
      Ok(())
    } else {
      Err(VmError::TypeError(format!("Cannot redefine property: {key}")))
    }
  }

  /// Own property keys in insertion order.
  pub fn own_property_keys(&self, obj: GcObject) -> Result<Vec<String>, VmError> {
    Ok(
      self
        .get_object_base(obj)?
        .properties
        .iter()
        .map(|entry| entry.key.to_string())
        .collect(),
    )
  }

  pub(crate) fn get_object_base(&self, obj: GcObject) -> Result<&ObjectBase, VmError> {
    match self.get_heap_object(obj.0)? {
      HeapObject::Object(o) => Ok(&o.base),
      HeapObject::Function(f) => Ok(&f.base),
      HeapObject::Promise(p) => Ok(&p.base),
      _ => Err(VmError::InvalidHandle),
    }
  }

  fn get_object_base_mut(&mut self, obj: GcObject) -> Result<&mut ObjectBase, VmError> {
    match self.get_heap_object_mut(obj.0)? {
      HeapObject::Object(o) => Ok(&mut o.base),
      HeapObject::Function(f) => Ok(&mut f.base),
      HeapObject::Promise(p) => Ok(&mut p.base),
      _ => Err(VmError::InvalidHandle),
    }
  }

  pub(crate) fn get_function(&self, obj: GcObject) -> Result<&JsFunction, VmError> {
    match self.get_heap_object(obj.0)? {
      HeapObject::Function(f) => Ok(f),
      _ => Err(VmError::NotCallable),
    }
  }

  pub(crate) fn get_promise(&self, obj: GcObject) -> Result<&JsPromise, VmError> {
    match self.get_heap_object(obj.0)? {
      HeapObject::Promise(p) => Ok(p),
      _ => Err(VmError::TypeError("object is not a promise".to_string())),
    }
  }

  pub(crate) fn get_promise_mut(&mut self, obj: GcObject) -> Result<&mut JsPromise, VmError> {
    match self.get_heap_object_mut(obj.0)? {
      HeapObject::Promise(p) => Ok(p),
      _ => Err(VmError::TypeError("object is not a promise".to_string())),
    }
  }

  pub(crate) fn get_env(&self, env: GcEnv) -> Result<&EnvRecord, VmError> {
    match self.get_heap_object(env.0)? {
      HeapObject::Env(e) => Ok(e),
      _ => Err(VmError::InvalidHandle),
    }
  }

  pub(crate) fn get_env_mut(&mut self, env: GcEnv) -> Result<&mut EnvRecord, VmError> {
    match self.get_heap_object_mut(env.0)? {
      HeapObject::Env(e) => Ok(e),
      _ => Err(VmError::InvalidHandle),
    }
  }

  pub(crate) fn get_realm(&self, realm: RealmId) -> Result<&RealmRecord, VmError> {
    match self.get_heap_object(realm.0)? {
      HeapObject::Realm(r) => Ok(r),
      _ => Err(VmError::InvalidHandle),
    }
  }

  pub(crate) fn alloc(&mut self, obj: HeapObject) -> Result<HeapId, VmError> {
    let bytes = obj.heap_size_bytes();
    self.ensure_can_allocate(bytes)?;
    Ok(self.alloc_unchecked(obj, bytes))
  }

  /// Recomputes the accounted size of `id` after a mutation grew or shrank it.
  pub(crate) fn refresh_slot_bytes(&mut self, id: HeapId) {
    let Some(idx) = self.validate(id) else {
      return;
    };
    let slot = &mut self.slots[idx];
    let new_bytes = slot.value.as_ref().map_or(0, HeapObject::heap_size_bytes);
    self.used_bytes = self
      .used_bytes
      .saturating_sub(slot.bytes)
      .saturating_add(new_bytes);
    slot.bytes = new_bytes;
  }

  pub(crate) fn ensure_can_allocate(&self, new_bytes: usize) -> Result<(), VmError> {
    let after = self.used_bytes.saturating_add(new_bytes);
    if after > self.limits.max_bytes {
      return Err(VmError::OutOfMemory);
    }
    Ok(())
  }

  fn get_heap_object(&self, id: HeapId) -> Result<&HeapObject, VmError> {
    let idx = self.validate(id).ok_or(VmError::InvalidHandle)?;
    self.slots[idx].value.as_ref().ok_or(VmError::InvalidHandle)
  }

  fn get_heap_object_mut(&mut self, id: HeapId) -> Result<&mut HeapObject, VmError> {
    let idx = self.validate(id).ok_or(VmError::InvalidHandle)?;
    self.slots[idx].value.as_mut().ok_or(VmError::InvalidHandle)
  }

  fn validate(&self, id: HeapId) -> Option<usize> {
    validate_slot(&self.slots, id)
  }

  fn alloc_unchecked(&mut self, obj: HeapObject, new_bytes: usize) -> HeapId {
    let idx = match self.free_list.pop() {
      Some(idx) => idx as usize,
      None => {
        let idx = self.slots.len();
        self.slots.push(Slot::new());
        self.marks.push(0);
        idx
      }
    };

    let slot = &mut self.slots[idx];
    debug_assert!(slot.value.is_none(), "free list returned an occupied slot");

    slot.value = Some(obj);
    slot.bytes = new_bytes;
    self.used_bytes = self.used_bytes.saturating_add(new_bytes);

    HeapId::from_parts(idx as u32, slot.generation)
  }
}

fn validate_slot(slots: &[Slot], id: HeapId) -> Option<usize> {
  let idx = id.index() as usize;
  let slot = slots.get(idx)?;
  if slot.generation != id.generation() || slot.value.is_none() {
    return None;
  }
  Some(idx)
}

#[derive(Debug)]
struct Slot {
  generation: u32,
  value: Option<HeapObject>,
  bytes: usize,
}

impl Slot {
  fn new() -> Self {
    Self {
      generation: 0,
      value: None,
      bytes: 0,
    }
  }
}

#[derive(Debug)]
pub(crate) enum HeapObject {
  String(JsString),
  Object(JsObject),
  Function(JsFunction),
  Promise(JsPromise),
  Env(EnvRecord),
  Realm(RealmRecord),
}

impl HeapObject {
  fn heap_size_bytes(&self) -> usize {
    let extra = match self {
      HeapObject::String(s) => s.heap_size_bytes(),
      HeapObject::Object(o) => o.base.heap_size_bytes(),
      HeapObject::Function(f) => f.base.heap_size_bytes(),
      HeapObject::Promise(p) => p.heap_size_bytes(),
      HeapObject::Env(e) => e.heap_size_bytes(),
      HeapObject::Realm(_) => 0,
    };
    mem::size_of::<Self>().saturating_add(extra)
  }
}

impl Trace for HeapObject {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    match self {
      // Strings have no outgoing references.
      HeapObject::String(_) => {}
      HeapObject::Object(o) => o.trace(tracer),
      HeapObject::Function(f) => f.trace(tracer),
      HeapObject::Promise(p) => p.trace(tracer),
      HeapObject::Env(e) => e.trace(tracer),
      HeapObject::Realm(r) => r.trace(tracer),
    }
  }
}

/// What kind of object a plain heap object is.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ObjectClass {
  Ordinary,
  Error(NativeErrorKind),
  ModuleNamespace,
  /// A ShadowRealm instance: the realm it created and the context used to re-enter it.
  ShadowRealm {
    realm: RealmId,
    context: ExecutionContext,
  },
}

impl Trace for ObjectClass {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    if let ObjectClass::ShadowRealm { realm, context } = self {
      tracer.trace_realm(*realm);
      context.trace(tracer);
    }
  }
}

#[derive(Debug)]
pub(crate) struct ObjectBase {
  pub(crate) prototype: Option<GcObject>,
  pub(crate) extensible: bool,
  properties: Vec<PropertyEntry>,
}

impl ObjectBase {
  pub(crate) fn new(prototype: Option<GcObject>) -> Self {
    Self {
      prototype,
      extensible: true,
      properties: Vec::new(),
    }
  }

  fn find(&self, key: &str) -> Option<&PropertyEntry> {
    self.properties.iter().find(|entry| &*entry.key == key)
  }

  fn find_mut(&mut self, key: &str) -> Option<&mut PropertyEntry> {
    self.properties.iter_mut().find(|entry| &*entry.key == key)
  }

  pub(crate) fn heap_size_bytes(&self) -> usize {
    self
      .properties
      .iter()
      .map(|entry| PropertyEntry::heap_size_bytes_for_key(&entry.key))
      .sum()
  }
}

impl Trace for ObjectBase {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Some(proto) = self.prototype {
      tracer.trace_object(proto);
    }
    for entry in &self.properties {
      entry.desc.trace(tracer);
    }
  }
}

#[derive(Debug)]
pub(crate) struct JsObject {
  base: ObjectBase,
  class: ObjectClass,
}

impl Trace for JsObject {
  fn trace(&self, tracer: &mut Tracer<'_>) {
    self.base.trace(tracer);
    self.class.trace(tracer);
  }
}

#[derive(Debug)]
struct PropertyEntry {
  key: Box<str>,
  desc: PropertyDescriptor,
}

impl PropertyEntry {
  fn heap_size_bytes_for_key(key: &str) -> usize {
    mem::size_of::<Self>().saturating_add(key.len())
  }
}

/// A structure holding GC references that must be visited during marking.
pub trait Trace {
  fn trace(&self, tracer: &mut Tracer<'_>);
}

/// The mark phase worklist, handed to [`Trace`] implementations.
pub struct Tracer<'a> {
  slots: &'a [Slot],
  marks: &'a mut [u8],
  worklist: Vec<HeapId>,
}

impl<'a> Tracer<'a> {
  fn new(slots: &'a [Slot], marks: &'a mut [u8]) -> Self {
    Self {
      slots,
      marks,
      worklist: Vec::new(),
    }
  }

  fn pop_work(&mut self) -> Option<HeapId> {
    self.worklist.pop()
  }

  pub fn trace_value(&mut self, value: Value) {
    match value {
      Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) => {}
      Value::String(s) => self.trace_heap_id(s.0),
      Value::Object(o) => self.trace_heap_id(o.0),
    }
  }

  pub fn trace_object(&mut self, obj: GcObject) {
    self.trace_heap_id(obj.0);
  }

  pub fn trace_env(&mut self, env: GcEnv) {
    self.trace_heap_id(env.0);
  }

  pub fn trace_realm(&mut self, realm: RealmId) {
    self.trace_heap_id(realm.0);
  }

  pub fn trace_ref(&mut self, r: GcRef) {
    if let Some(id) = r.heap_id() {
      self.trace_heap_id(id);
    }
  }

  fn trace_heap_id(&mut self, id: HeapId) {
    let Some(idx) = self.validate(id) else {
      return;
    };
    if self.marks[idx] != 0 {
      return;
    }
    self.worklist.push(id);
  }

  fn validate(&self, id: HeapId) -> Option<usize> {
    let idx = validate_slot(self.slots, id);
    debug_assert!(idx.is_some(), "stale handle during GC: {id:?}");
    idx
  }
}
