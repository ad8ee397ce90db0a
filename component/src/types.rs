//! Type descriptors and the type-erased object handle.
//!
//! Every definition and every singleton carries a [`TypeInfo`] computed once,
//! when it is built. Lookups compare descriptors by value instead of inspecting
//! objects at run time: a descriptor knows its own identity, whether it stands
//! for a plain value, a shared pointer or an interface, and the set of
//! interfaces (`dyn Trait`) it was declared to provide.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

type ErasedValue = Arc<dyn Any + Send + Sync>;
type CastFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// How a type was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
  /// A plain value owned by the container.
  Value,
  /// An `Arc<T>` handed to the container by its constructor.
  Pointer {
    pointee: TypeId,
    pointee_name: &'static str,
  },
  /// An `Arc<dyn Trait>`.
  Interface,
}

/// The interned identity of a type, as used by every filter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
  kind: TypeKind,
}

impl TypeKey {
  /// The key of `T` itself. `T` may be a `dyn Trait`, in which case it is
  /// matched against declared capabilities.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
      kind: TypeKind::Value,
    }
  }

  /// The key of `Arc<T>` produced by a shared constructor.
  pub fn pointer<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<Arc<T>>(),
      name: type_name::<Arc<T>>(),
      kind: TypeKind::Pointer {
        pointee: TypeId::of::<T>(),
        pointee_name: type_name::<T>(),
      },
    }
  }

  /// The key of an interface type produced by an interface constructor.
  pub fn interface<I: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<I>(),
      name: type_name::<I>(),
      kind: TypeKind::Interface,
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  /// The package-qualified name of the type.
  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn kind(&self) -> TypeKind {
    self.kind
  }

  pub fn is_pointer(&self) -> bool {
    matches!(self.kind, TypeKind::Pointer { .. })
  }

  pub fn is_interface(&self) -> bool {
    matches!(self.kind, TypeKind::Interface)
  }

  /// The id of the type objects of this key are stored as.
  pub(crate) fn element_id(&self) -> TypeId {
    match self.kind {
      TypeKind::Pointer { pointee, .. } => pointee,
      _ => self.id,
    }
  }

  /// The unqualified name of the type, looking through pointers.
  ///
  /// `app::repo::UserRepository` and `Arc<app::repo::UserRepository>` both
  /// give `UserRepository`; `dyn app::Greeter` gives `Greeter`.
  pub fn simple_name(&self) -> &'static str {
    let full = match self.kind {
      TypeKind::Pointer { pointee_name, .. } => pointee_name,
      _ => self.name,
    };
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      TypeKind::Value => write!(f, "TypeKey({})", self.name),
      TypeKind::Pointer { .. } => write!(f, "TypeKey(pointer {})", self.name),
      TypeKind::Interface => write!(f, "TypeKey(interface {})", self.name),
    }
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// An interface a type was declared to provide, with the cast that turns a
/// stored object into an `Arc<dyn Trait>`.
#[derive(Clone)]
pub struct Capability {
  key: TypeKey,
  cast: CastFn,
}

impl Capability {
  /// Declares that objects stored as `Arc<P>` can be viewed as `Arc<I>`.
  pub fn new<P, I>(cast: fn(Arc<P>) -> Arc<I>) -> Self
  where
    P: ?Sized + Any + Send + Sync,
    I: ?Sized + Any + Send + Sync,
  {
    Self {
      key: TypeKey::interface::<I>(),
      cast: Arc::new(move |value| {
        value
          .downcast_ref::<Arc<P>>()
          .map(|stored| Box::new(cast(Arc::clone(stored))) as Box<dyn Any + Send + Sync>)
      }),
    }
  }

  pub fn key(&self) -> &TypeKey {
    &self.key
  }
}

impl fmt::Debug for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Capability").field(&self.key.name).finish()
  }
}

/// The descriptor of a produced type: its key plus its declared capabilities.
#[derive(Clone, Debug)]
pub struct TypeInfo {
  key: TypeKey,
  capabilities: Vec<Capability>,
}

impl TypeInfo {
  pub fn new(key: TypeKey) -> Self {
    Self {
      key,
      capabilities: Vec::new(),
    }
  }

  pub(crate) fn add_capability(&mut self, capability: Capability) {
    self
      .capabilities
      .retain(|existing| existing.key.id != capability.key.id);
    self.capabilities.push(capability);
  }

  pub fn key(&self) -> &TypeKey {
    &self.key
  }

  pub fn name(&self) -> &'static str {
    self.key.name
  }

  pub fn capabilities(&self) -> impl Iterator<Item = &TypeKey> {
    self.capabilities.iter().map(|capability| &capability.key)
  }

  pub fn provides(&self, id: TypeId) -> bool {
    self.key.id == id
      || self.key.element_id() == id
      || self.capabilities.iter().any(|capability| capability.key.id == id)
  }

  /// Whether an object described by `self` satisfies `required`.
  ///
  /// A candidate satisfies a required type when it is the same type, when the
  /// required type is an interface in the candidate's capability set, or when
  /// the candidate is a pointer to a struct whose qualified name equals the
  /// required value type's.
  pub fn is_assignable_to(&self, required: &TypeKey) -> bool {
    if self.key.id == required.id {
      return true;
    }

    if required.is_pointer() {
      return false;
    }

    if self
      .capabilities
      .iter()
      .any(|capability| capability.key.id == required.id)
    {
      return true;
    }

    match self.key.kind {
      TypeKind::Pointer { pointee_name, .. } => {
        required.kind == TypeKind::Value && pointee_name == required.name
      }
      _ => false,
    }
  }
}

/// A type-erased, shared handle to an object produced or held by the container.
///
/// Cloning an `Object` clones the handle, not the object.
#[derive(Clone)]
pub struct Object {
  value: ErasedValue,
  info: Arc<TypeInfo>,
}

impl Object {
  /// Wraps a plain value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_shared(Arc::new(value), TypeInfo::new(TypeKey::of::<T>()))
  }

  /// Wraps an already shared value; the object is described as a pointer to `T`.
  pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self::from_shared(value, TypeInfo::new(TypeKey::pointer::<T>()))
  }

  /// Wraps an interface object.
  pub fn interface<I: ?Sized + Any + Send + Sync>(value: Arc<I>) -> Self {
    Self::from_shared(value, TypeInfo::new(TypeKey::interface::<I>()))
  }

  pub(crate) fn from_shared<P: ?Sized + Any + Send + Sync>(value: Arc<P>, info: TypeInfo) -> Self {
    Self::from_parts(Arc::new(value), Arc::new(info))
  }

  pub(crate) fn from_parts(value: ErasedValue, info: Arc<TypeInfo>) -> Self {
    Self { value, info }
  }

  /// Declares an interface this object provides. `P` must be the type the
  /// object is stored as.
  pub fn with_capability<P, I>(mut self, cast: fn(Arc<P>) -> Arc<I>) -> Self
  where
    P: ?Sized + Any + Send + Sync,
    I: ?Sized + Any + Send + Sync,
  {
    Arc::make_mut(&mut self.info).add_capability(Capability::new(cast));
    self
  }

  pub fn type_info(&self) -> &TypeInfo {
    &self.info
  }

  pub fn type_name(&self) -> &'static str {
    self.info.name()
  }

  /// Whether this object can be viewed as `T`.
  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.info.provides(TypeId::of::<T>())
  }

  /// Views this object as `Arc<T>`, where `T` is the stored type or one of
  /// the declared interfaces.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    let target = TypeId::of::<T>();

    if self.info.key.element_id() == target {
      return self.value.downcast_ref::<Arc<T>>().cloned();
    }

    self
      .info
      .capabilities
      .iter()
      .find(|capability| capability.key.id == target)
      .and_then(|capability| (capability.cast)(&*self.value))
      .and_then(|boxed| boxed.downcast::<Arc<T>>().ok())
      .map(|arc_in_a_box| *arc_in_a_box)
  }

  /// Identity comparison: `true` when both handles refer to the same object.
  pub fn ptr_eq(&self, other: &Object) -> bool {
    Arc::ptr_eq(&self.value, &other.value)
  }
}

impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Object")
      .field("type", &self.info.name())
      .finish_non_exhaustive()
  }
}
