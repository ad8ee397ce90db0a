//! Constructor shapes and injectable parameter types.
//!
//! A constructor is any `Fn(A1, .., An) -> R` (up to eight parameters) whose
//! parameters all implement [`Inject`]. The parameter types decide how each
//! argument is resolved:
//!
//! | parameter          | resolved as                                          |
//! |--------------------|------------------------------------------------------|
//! | `Arc<T>`           | one object assignable to `T` (required)              |
//! | `Option<Arc<T>>`   | one object assignable to `T`, `None` when missing    |
//! | `Vec<Arc<T>>`      | every object assignable to `T`, possibly empty       |
//! | `Value<T>`         | a clone of one `T`, or `T::default()` when missing   |

use crate::types::{Object, TypeKey};
use std::any::{type_name, Any};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// How a constructor parameter is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
  Reference,
  Optional,
  Collection,
  Value,
}

impl ArgumentKind {
  /// Whether a missing dependency of this kind can be replaced by an absent value.
  pub fn can_be_absent(&self) -> bool {
    !matches!(self, ArgumentKind::Reference)
  }
}

/// The static description of one constructor parameter.
#[derive(Debug, Clone, Copy)]
pub struct Parameter {
  pub required: TypeKey,
  pub kind: ArgumentKind,
}

/// The outcome of resolving one argument, handed to the constructor.
#[derive(Debug)]
pub enum Resolved {
  Object(Object),
  List(Vec<Object>),
  /// Substitute the zero value of a value parameter.
  Zero,
  /// Substitute the absent value of an optional parameter.
  Absent,
}

/// A type that can appear as a constructor parameter.
pub trait Inject: Sized + 'static {
  fn parameter() -> Parameter;

  /// Converts a resolved argument. `None` means the resolved object could not
  /// be viewed as this parameter's type.
  fn from_resolved(resolved: Resolved) -> Option<Self>;
}

impl<T: ?Sized + Any + Send + Sync> Inject for Arc<T> {
  fn parameter() -> Parameter {
    Parameter {
      required: TypeKey::of::<T>(),
      kind: ArgumentKind::Reference,
    }
  }

  fn from_resolved(resolved: Resolved) -> Option<Self> {
    match resolved {
      Resolved::Object(object) => object.get::<T>(),
      _ => None,
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> Inject for Option<Arc<T>> {
  fn parameter() -> Parameter {
    Parameter {
      required: TypeKey::of::<T>(),
      kind: ArgumentKind::Optional,
    }
  }

  fn from_resolved(resolved: Resolved) -> Option<Self> {
    match resolved {
      Resolved::Object(object) => object.get::<T>().map(Some),
      Resolved::Absent => Some(None),
      _ => None,
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> Inject for Vec<Arc<T>> {
  fn parameter() -> Parameter {
    Parameter {
      required: TypeKey::of::<T>(),
      kind: ArgumentKind::Collection,
    }
  }

  fn from_resolved(resolved: Resolved) -> Option<Self> {
    match resolved {
      Resolved::List(objects) => Some(objects.iter().filter_map(Object::get::<T>).collect()),
      Resolved::Absent => Some(Vec::new()),
      _ => None,
    }
  }
}

/// A by-value dependency on a concrete type.
///
/// When no component of type `T` exists the parameter receives
/// `T::default()` instead of failing construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value<T>(pub T);

impl<T> Value<T> {
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> Deref for Value<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T> DerefMut for Value<T> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.0
  }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl<T: Any + Send + Sync + Default + Clone> Inject for Value<T> {
  fn parameter() -> Parameter {
    Parameter {
      required: TypeKey::of::<T>(),
      kind: ArgumentKind::Value,
    }
  }

  fn from_resolved(resolved: Resolved) -> Option<Self> {
    match resolved {
      Resolved::Object(object) => object.get::<T>().map(|value| Value((*value).clone())),
      Resolved::Zero | Resolved::Absent => Some(Value(T::default())),
      _ => None,
    }
  }
}

/// Raised when a resolved argument cannot be converted into its parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentMismatch {
  pub index: usize,
  pub expected: &'static str,
}

/// A function usable as a component constructor.
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to eight [`Inject`]
/// parameters; `Args` is the parameter tuple and only serves to keep the
/// implementations apart.
pub trait Constructor<Args, R>: Send + Sync + 'static {
  fn parameters() -> Vec<Parameter>;

  fn construct(&self, arguments: Vec<Resolved>) -> Result<R, ArgumentMismatch>;
}

fn take<A: Inject>(
  arguments: &mut std::vec::IntoIter<Resolved>,
  index: &mut usize,
) -> Result<A, ArgumentMismatch> {
  let mismatch = ArgumentMismatch {
    index: *index,
    expected: type_name::<A>(),
  };
  *index += 1;

  arguments
    .next()
    .and_then(A::from_resolved)
    .ok_or(mismatch)
}

macro_rules! impl_constructor {
  ($($arg:ident),*) => {
    impl<F, R, $($arg,)*> Constructor<($($arg,)*), R> for F
    where
      F: Fn($($arg),*) -> R + Send + Sync + 'static,
      $($arg: Inject,)*
    {
      fn parameters() -> Vec<Parameter> {
        vec![$($arg::parameter()),*]
      }

      #[allow(unused_mut, unused_variables)]
      fn construct(&self, arguments: Vec<Resolved>) -> Result<R, ArgumentMismatch> {
        let mut arguments = arguments.into_iter();
        let mut index = 0;
        Ok((self)($(take::<$arg>(&mut arguments, &mut index)?),*))
      }
    }
  };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, Default, PartialEq)]
  struct Port(u16);

  fn parameters_of<Args, R, F: Constructor<Args, R>>(_: &F) -> Vec<Parameter> {
    F::parameters()
  }

  #[test]
  fn parameters_follow_the_signature() {
    let constructor = |_: Arc<String>, _: Option<Arc<Port>>, _: Vec<Arc<Port>>, _: Value<Port>| 0u8;
    let kinds: Vec<ArgumentKind> = parameters_of(&constructor)
      .into_iter()
      .map(|parameter| parameter.kind)
      .collect();

    assert_eq!(
      kinds,
      vec![
        ArgumentKind::Reference,
        ArgumentKind::Optional,
        ArgumentKind::Collection,
        ArgumentKind::Value
      ]
    );
  }

  #[test]
  fn construct_converts_resolved_arguments() {
    let constructor = |port: Value<Port>, name: Option<Arc<String>>| (port.into_inner(), name);
    let (port, name) = constructor
      .construct(vec![Resolved::Zero, Resolved::Absent])
      .unwrap();

    assert_eq!(port, Port(0));
    assert!(name.is_none());
  }

  #[test]
  fn construct_reports_the_mismatching_index() {
    let constructor = |_: Value<Port>, _: Arc<String>| ();
    let mismatch = constructor
      .construct(vec![Resolved::Object(Object::new(Port(80))), Resolved::Absent])
      .unwrap_err();

    assert_eq!(mismatch.index, 1);
  }
}
