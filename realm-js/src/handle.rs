use crate::value::Value;
use core::fmt;

/// A stable identifier for an allocation in the [`Heap`](crate::Heap).
///
/// This is a packed `{ index: u32, generation: u32 }`. The slot generation is bumped every time
/// the slot is freed, so a handle to a collected allocation never aliases a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HeapId(pub(crate) u64);

impl HeapId {
  pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
    Self((index as u64) | ((generation as u64) << 32))
  }

  #[inline]
  pub fn index(self) -> u32 {
    self.0 as u32
  }

  #[inline]
  pub fn generation(self) -> u32 {
    (self.0 >> 32) as u32
  }
}

impl fmt::Debug for HeapId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HeapId")
      .field("index", &self.index())
      .field("generation", &self.generation())
      .finish()
  }
}

/// A GC-managed object (ordinary object, function, promise, namespace, ShadowRealm).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct GcObject(pub(crate) HeapId);

/// A GC-managed string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct GcString(pub(crate) HeapId);

/// A GC-managed environment record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct GcEnv(pub(crate) HeapId);

/// A GC-managed realm record.
///
/// Realms live in the heap like any other allocation; a realm is collected once nothing reachable
/// names it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct RealmId(pub(crate) HeapId);

macro_rules! impl_handle_id {
  ($($ty:ident),*) => {
    $(
      impl $ty {
        /// The underlying [`HeapId`].
        #[inline]
        pub fn id(self) -> HeapId {
          self.0
        }
      }
    )*
  };
}

impl_handle_id!(GcObject, GcString, GcEnv, RealmId);

/// A persistent root created by [`Heap::add_root`](crate::Heap::add_root).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct RootId(pub(crate) u32);

/// Any GC-managed reference, as accepted by [`Heap::register_edge`](crate::Heap::register_edge).
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GcRef {
  Value(Value),
  Env(GcEnv),
  Realm(RealmId),
}

impl GcRef {
  /// The heap allocation this reference points at, if any (primitives have none).
  pub fn heap_id(self) -> Option<HeapId> {
    match self {
      GcRef::Value(Value::String(s)) => Some(s.0),
      GcRef::Value(Value::Object(o)) => Some(o.0),
      GcRef::Value(_) => None,
      GcRef::Env(env) => Some(env.0),
      GcRef::Realm(realm) => Some(realm.0),
    }
  }
}

impl From<Value> for GcRef {
  fn from(value: Value) -> Self {
    GcRef::Value(value)
  }
}

impl From<GcObject> for GcRef {
  fn from(obj: GcObject) -> Self {
    GcRef::Value(Value::Object(obj))
  }
}

impl From<GcEnv> for GcRef {
  fn from(env: GcEnv) -> Self {
    GcRef::Env(env)
  }
}

impl From<RealmId> for GcRef {
  fn from(realm: RealmId) -> Self {
    GcRef::Realm(realm)
  }
}
