//! Core, non-public data structures for the container.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashSet;

thread_local! {
  // The prototype and custom-scoped objects currently being prepared on this
  // thread, per container. Nested resolution always happens on the caller's
  // thread, so this is exactly the set of one top-level request.
  static PREPARING: RefCell<HashSet<PreparationKey>> = RefCell::new(HashSet::new());
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PreparationKey {
  container: u64,
  name: String,
}

/// An RAII guard marking an object as in preparation for the current request.
///
/// Creating it fails with [`Error::CircularDependency`] if the object is
/// already being prepared further up the same call stack. Dropping it clears
/// the mark, whether construction succeeded or not.
#[derive(Debug)]
pub(crate) struct PreparationGuard {
  key: PreparationKey,
}

impl PreparationGuard {
  pub(crate) fn enter(container: u64, name: &str) -> Result<Self> {
    let key = PreparationKey {
      container,
      name: name.to_owned(),
    };

    PREPARING.with(|preparing| {
      // `insert` returns `false` if the value was already present.
      if preparing.borrow_mut().insert(key.clone()) {
        Ok(Self { key })
      } else {
        Err(Error::CircularDependency {
          name: name.to_owned(),
        })
      }
    })
  }
}

impl Drop for PreparationGuard {
  fn drop(&mut self) {
    PREPARING.with(|preparing| {
      preparing.borrow_mut().remove(&self.key);
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reentry_is_circular_until_the_guard_drops() {
    let guard = PreparationGuard::enter(1, "prototype").unwrap();
    assert!(PreparationGuard::enter(1, "prototype").unwrap_err().is_circular());
    assert!(PreparationGuard::enter(2, "prototype").is_ok());

    drop(guard);
    assert!(PreparationGuard::enter(1, "prototype").is_ok());
  }
}
