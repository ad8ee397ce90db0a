//! Composable lookup filters shared by definition and singleton queries.

use crate::error::Error;
use crate::types::{TypeInfo, TypeKey};
use std::any::Any;

/// A conjunction of lookup criteria: name equality and type compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
  name: Option<String>,
  key: Option<TypeKey>,
  // Further type criteria from `and`; a match must satisfy all of them.
  extra_keys: Vec<TypeKey>,
  // Set when `and` joined two different names.
  conflicting: bool,
}

/// Matches the object or definition registered under `name`.
pub fn by_name(name: impl Into<String>) -> Filter {
  Filter {
    name: Some(name.into()),
    ..Filter::default()
  }
}

/// Matches everything assignable to `T`. `T` may be a `dyn Trait`.
pub fn by_type<T: ?Sized + Any>() -> Filter {
  by_key(TypeKey::of::<T>())
}

/// Matches only objects produced as `Arc<T>` by shared constructors.
pub fn by_pointer<T: ?Sized + Any>() -> Filter {
  by_key(TypeKey::pointer::<T>())
}

pub fn by_key(key: TypeKey) -> Filter {
  Filter {
    key: Some(key),
    ..Filter::default()
  }
}

impl Filter {
  /// Requires both filters to match.
  ///
  /// Two different names can never both match, so the result matches
  /// nothing. Two type criteria must both be satisfied.
  pub fn and(mut self, other: Filter) -> Filter {
    if let Some(other_name) = other.name {
      if self.name.is_none() {
        self.name = Some(other_name);
      } else if self.name.as_deref() != Some(other_name.as_str()) {
        self.conflicting = true;
      }
    }
    self.conflicting |= other.conflicting;

    for key in other.key.into_iter().chain(other.extra_keys) {
      match self.key {
        None => self.key = Some(key),
        Some(existing) if existing == key => {}
        Some(_) if self.extra_keys.contains(&key) => {}
        Some(_) => self.extra_keys.push(key),
      }
    }

    self
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn key(&self) -> Option<&TypeKey> {
    self.key.as_ref()
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.key.is_none()
  }

  pub fn matches(&self, name: &str, info: &TypeInfo) -> bool {
    if self.conflicting {
      return false;
    }

    if let Some(expected) = &self.name {
      if expected != name {
        return false;
      }
    }

    self
      .key
      .iter()
      .chain(&self.extra_keys)
      .all(|required| info.is_assignable_to(required))
  }

  pub(crate) fn not_found(&self) -> Error {
    Error::NotFound {
      name: self.name.clone(),
      type_name: self.key.map(|key| key.name()),
    }
  }

  pub(crate) fn ambiguous(&self, candidates: Vec<String>) -> Error {
    Error::Ambiguous {
      name: self.name.clone(),
      type_name: self.key.map(|key| key.name()),
      candidates,
    }
  }

  /// Whether `error` reports a miss for exactly this filter, as opposed to a
  /// miss deeper in the dependency graph.
  pub(crate) fn is_missing(&self, error: &Error) -> bool {
    match error {
      Error::NotFound { name, type_name } => {
        name.as_deref() == self.name() && *type_name == self.key.map(|key| key.name())
      }
      _ => false,
    }
  }
}
