//! Hooks applied to every object the container produces.

use crate::error::BoxError;
use crate::types::Object;
use std::any::type_name;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// A cross-cutting hook run around the initialization of every created object.
///
/// Either phase may return a different object, for example a decorated one.
/// Returning `Ok(None)` fails the creation with
/// [`Error::ProcessorReturnedNil`](crate::Error::ProcessorReturnedNil).
pub trait ObjectProcessor: Send + Sync {
  fn process_before_init(&self, object: Object) -> Result<Option<Object>, BoxError> {
    Ok(Some(object))
  }

  fn process_after_init(&self, object: Object) -> Result<Option<Object>, BoxError> {
    Ok(Some(object))
  }

  /// Identifies the processor in errors and de-duplication. Defaults to the
  /// implementing type's name.
  fn processor_name(&self) -> &'static str {
    type_name::<Self>()
  }
}

/// Self-initialization, run between the two processor phases.
pub trait Initialize: Send + Sync {
  fn init(&self) -> Result<(), BoxError>;
}

/// Reports objects created before every expected processor was registered,
/// since those objects miss some processing.
pub(crate) struct ProcessorChecker {
  registered: Arc<AtomicUsize>,
  expected: usize,
}

impl ProcessorChecker {
  pub(crate) fn new(registered: Arc<AtomicUsize>, expected: usize) -> Self {
    Self { registered, expected }
  }
}

impl ObjectProcessor for ProcessorChecker {
  fn process_after_init(&self, object: Object) -> Result<Option<Object>, BoxError> {
    let registered = self.registered.load(Ordering::Acquire);
    if registered < self.expected && !object.is::<dyn ObjectProcessor>() {
      info!(
        type_name = object.type_name(),
        registered,
        expected = self.expected,
        "object is not eligible for processing by all object processors"
      );
    }
    Ok(Some(object))
  }
}
