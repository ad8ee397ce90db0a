//! Lifetime policies for created objects.

use crate::error::Result;
use crate::singleton::SingletonRegistry;
use crate::types::Object;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// The scope of objects created once and cached for the container's lifetime.
pub const SINGLETON: &str = "singleton";
/// The scope of objects created anew on every request.
pub const PROTOTYPE: &str = "prototype";

/// Builds the object on demand. Scopes decide whether to call it.
pub type ObjectProvider<'a> = &'a dyn Fn() -> Result<Object>;

/// A pluggable caching policy, registered on a container under a name.
pub trait Scope: Send + Sync {
  /// Returns the object for `name` in this scope, calling `provider` if the
  /// scope has none yet.
  fn get_object(&self, name: &str, provider: ObjectProvider<'_>) -> Result<Object>;

  fn remove_object(&self, name: &str) -> Option<Object>;
}

/// Delegates to the container's [`SingletonRegistry`].
pub struct SingletonScope {
  registry: Arc<SingletonRegistry>,
}

impl SingletonScope {
  pub fn new(registry: Arc<SingletonRegistry>) -> Self {
    Self { registry }
  }
}

impl Scope for SingletonScope {
  fn get_object(&self, name: &str, provider: ObjectProvider<'_>) -> Result<Object> {
    self.registry.or_else_create(name, provider)
  }

  fn remove_object(&self, name: &str) -> Option<Object> {
    self.registry.remove(name)
  }
}

/// Never caches; every request gets a fresh object.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
  fn get_object(&self, _name: &str, provider: ObjectProvider<'_>) -> Result<Object> {
    provider()
  }

  fn remove_object(&self, _name: &str) -> Option<Object> {
    None
  }
}

/// Caches one object per name per thread.
///
/// Useful as a request scope when each request is served on its own thread.
#[derive(Default)]
pub struct ThreadScope {
  objects: Mutex<HashMap<(ThreadId, String), Object>>,
}

impl ThreadScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drops every object cached for the calling thread.
  pub fn clear_current_thread(&self) {
    let me = thread::current().id();
    self.objects.lock().retain(|(owner, _), _| *owner != me);
  }
}

impl Scope for ThreadScope {
  fn get_object(&self, name: &str, provider: ObjectProvider<'_>) -> Result<Object> {
    let key = (thread::current().id(), name.to_string());
    if let Some(object) = self.objects.lock().get(&key) {
      return Ok(object.clone());
    }

    // Only this thread writes this key, so nobody can race us to it.
    let object = provider()?;
    self.objects.lock().insert(key, object.clone());
    Ok(object)
  }

  fn remove_object(&self, name: &str) -> Option<Object> {
    let key = (thread::current().id(), name.to_string());
    self.objects.lock().remove(&key)
  }
}
