//! The cache of realized singleton objects, with single-flight creation.

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::types::Object;
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

struct Singleton {
  object: Object,
  sequence: u64,
}

/// A creation in progress. Identity matters: waiters compare the current
/// flight for a name against the one they started waiting on.
struct Flight {
  leader: ThreadId,
}

#[derive(Default)]
struct Flights {
  in_flight: HashMap<String, Arc<Flight>>,
  /// Which name each blocked thread is waiting for.
  waiting: HashMap<ThreadId, String>,
}

impl Flights {
  /// Whether `me` waiting on a flight led by `leader` would close a wait-for
  /// cycle, i.e. `leader` is (transitively) waiting for something `me` leads.
  fn closes_cycle(&self, me: ThreadId, leader: ThreadId) -> bool {
    let mut visited = HashSet::new();
    let mut current = leader;

    loop {
      if current == me {
        return true;
      }
      if !visited.insert(current) {
        return false;
      }

      let next = self
        .waiting
        .get(&current)
        .and_then(|name| self.in_flight.get(name))
        .map(|flight| flight.leader);

      match next {
        Some(leader) => current = leader,
        None => return false,
      }
    }
  }
}

/// A thread-safe, name-keyed cache of fully constructed singletons.
///
/// Entry existence implies the object is fully constructed and initialized.
/// [`or_else_create`](SingletonRegistry::or_else_create) runs the provider for
/// a given name at most once at a time; concurrent callers for the same name
/// block and reuse the leader's object, while callers for different names
/// never wait on each other.
#[derive(Default)]
pub struct SingletonRegistry {
  objects: RwLock<HashMap<String, Singleton>>,
  sequence: AtomicU64,
  flights: Mutex<Flights>,
  completed: Condvar,
}

impl SingletonRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a fully constructed object under `name`.
  ///
  /// Fails with [`Error::DuplicateName`] if the name is bound or currently
  /// being created.
  pub fn register(&self, name: impl Into<String>, object: Object) -> Result<()> {
    let name = name.into();
    let flights = self.flights.lock();
    let mut objects = self.objects.write();

    if objects.contains_key(&name) || flights.in_flight.contains_key(&name) {
      return Err(Error::DuplicateName { name });
    }

    trace!(name = %name, type_name = object.type_name(), "singleton registered");
    objects.insert(
      name,
      Singleton {
        object,
        sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
      },
    );
    Ok(())
  }

  pub fn remove(&self, name: &str) -> Option<Object> {
    self.objects.write().remove(name).map(|singleton| singleton.object)
  }

  pub fn get(&self, name: &str) -> Option<Object> {
    self
      .objects
      .read()
      .get(name)
      .map(|singleton| singleton.object.clone())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.objects.read().contains_key(name)
  }

  pub fn count(&self) -> usize {
    self.objects.read().len()
  }

  /// Names of all singletons, in registration order.
  pub fn names(&self) -> Vec<String> {
    let objects = self.objects.read();
    let mut names: Vec<(u64, &String)> = objects
      .iter()
      .map(|(name, singleton)| (singleton.sequence, name))
      .collect();
    names.sort_unstable_by_key(|(sequence, _)| *sequence);
    names.into_iter().map(|(_, name)| name.clone()).collect()
  }

  /// Whether `name` is currently being created by some thread.
  pub fn is_in_preparation(&self, name: &str) -> bool {
    self.flights.lock().in_flight.contains_key(name)
  }

  /// Every singleton matching `filter`, in registration order.
  pub fn list(&self, filter: &Filter) -> Vec<Object> {
    self
      .matching(filter)
      .into_iter()
      .map(|(_, object)| object)
      .collect()
  }

  /// Finds the single singleton matching `filter`.
  pub fn find(&self, filter: &Filter) -> Result<Object> {
    if filter.is_empty() {
      return Err(Error::MissingFilter);
    }

    let mut matching = self.matching(filter);
    match matching.len() {
      0 => Err(filter.not_found()),
      1 => Ok(matching.remove(0).1),
      _ => Err(filter.ambiguous(matching.into_iter().map(|(name, _)| name).collect())),
    }
  }

  /// Like [`find`](Self::find) but tolerates ambiguity, returning the earliest
  /// registered match.
  pub fn find_first(&self, filter: &Filter) -> Option<Object> {
    self.matching(filter).into_iter().next().map(|(_, object)| object)
  }

  /// Returns the object bound to `name`, creating it with `provider` if absent.
  ///
  /// The provider runs outside every lock and its errors are never cached.
  /// Fails with [`Error::CircularDependency`] when the calling thread is
  /// already creating `name`, or when waiting for another thread would
  /// deadlock because that thread is (transitively) waiting for this one.
  pub fn or_else_create<F>(&self, name: &str, provider: F) -> Result<Object>
  where
    F: FnOnce() -> Result<Object>,
  {
    if let Some(object) = self.get(name) {
      return Ok(object);
    }

    let me = thread::current().id();
    let mut flights = self.flights.lock();

    let flight = loop {
      // 1. Re-check under the flights lock; a leader publishes before it
      //    retires its flight, so a finished creation is always visible here.
      if let Some(object) = self.get(name) {
        return Ok(object);
      }

      // 2. No creation in progress: become the leader.
      let current = match flights.in_flight.get(name) {
        Some(current) => Arc::clone(current),
        None => {
          let flight = Arc::new(Flight { leader: me });
          flights.in_flight.insert(name.to_string(), Arc::clone(&flight));
          break flight;
        }
      };

      // 3. Someone is creating it. Refuse to wait on ourselves, directly or
      //    through a chain of other waiting threads.
      if current.leader == me || flights.closes_cycle(me, current.leader) {
        return Err(Error::CircularDependency {
          name: name.to_string(),
        });
      }

      // 4. Wait until that flight retires, then start over: it either
      //    published the object or failed and left the name free.
      trace!(name = %name, "waiting for singleton creation on another thread");
      flights.waiting.insert(me, name.to_string());
      while flights
        .in_flight
        .get(name)
        .map_or(false, |flight| Arc::ptr_eq(flight, &current))
      {
        self.completed.wait(&mut flights);
      }
      flights.waiting.remove(&me);
    };
    drop(flights);

    let _guard = FlightGuard {
      registry: self,
      name,
      flight,
    };

    let object = provider()?;
    self.publish(name, object.clone());
    debug!(name = %name, type_name = object.type_name(), "singleton created");
    Ok(object)
  }

  /// Snapshot of the matching singletons together with every bound name, so
  /// listing can tell which definitions are already realized.
  pub(crate) fn snapshot(&self, filter: &Filter) -> (Vec<Object>, HashSet<String>) {
    let objects = self.objects.read();
    let names = objects.keys().cloned().collect();
    drop(objects);
    (self.list(filter), names)
  }

  fn publish(&self, name: &str, object: Object) {
    self.objects.write().insert(
      name.to_string(),
      Singleton {
        object,
        sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
      },
    );
  }

  fn matching(&self, filter: &Filter) -> Vec<(String, Object)> {
    let objects = self.objects.read();
    let mut matching: Vec<(u64, &String, &Singleton)> = match filter.name() {
      Some(name) => objects
        .get_key_value(name)
        .map(|(name, singleton)| (singleton.sequence, name, singleton))
        .into_iter()
        .collect(),
      None => objects
        .iter()
        .map(|(name, singleton)| (singleton.sequence, name, singleton))
        .collect(),
    };

    matching.retain(|(_, name, singleton)| filter.matches(name, singleton.object.type_info()));
    matching.sort_unstable_by_key(|(sequence, _, _)| *sequence);
    matching
      .into_iter()
      .map(|(_, name, singleton)| (name.clone(), singleton.object.clone()))
      .collect()
  }
}

/// Retires a flight when its leader finishes, whether it succeeded, failed or
/// panicked, and wakes every waiter.
struct FlightGuard<'a> {
  registry: &'a SingletonRegistry,
  name: &'a str,
  flight: Arc<Flight>,
}

impl Drop for FlightGuard<'_> {
  fn drop(&mut self) {
    let mut flights = self.registry.flights.lock();
    if flights
      .in_flight
      .get(self.name)
      .map_or(false, |flight| Arc::ptr_eq(flight, &self.flight))
    {
      flights.in_flight.remove(self.name);
    }
    drop(flights);
    self.registry.completed.notify_all();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::{by_name, by_type};

  #[test]
  fn closes_cycle_follows_the_wait_chain() {
    let registry = SingletonRegistry::new();
    let me = thread::current().id();
    let other = thread::spawn(|| thread::current().id()).join().unwrap();

    let mut flights = registry.flights.lock();
    flights
      .in_flight
      .insert("a".to_string(), Arc::new(Flight { leader: me }));
    assert!(!flights.closes_cycle(me, other));

    flights.waiting.insert(other, "a".to_string());
    assert!(flights.closes_cycle(me, other));
  }

  #[test]
  fn find_reports_ambiguity_and_find_first_does_not() {
    let registry = SingletonRegistry::new();
    registry.register("one", Object::new(1u32)).unwrap();
    registry.register("two", Object::new(2u32)).unwrap();

    assert!(registry.find(&by_type::<u32>()).unwrap_err().is_ambiguous());
    let first = registry.find_first(&by_type::<u32>()).unwrap();
    assert_eq!(*first.get::<u32>().unwrap(), 1);
    assert!(registry.find(&by_name("two")).is_ok());
    assert_eq!(registry.names(), vec!["one", "two"]);
  }

  #[test]
  fn failed_creation_is_not_cached() {
    let registry = SingletonRegistry::new();
    let err = registry
      .or_else_create("flaky", || Err(Error::CircularDependency { name: "x".into() }))
      .unwrap_err();
    assert!(err.is_circular());
    assert!(!registry.contains("flaky"));
    assert!(!registry.is_in_preparation("flaky"));

    let object = registry.or_else_create("flaky", || Ok(Object::new(7u8))).unwrap();
    assert_eq!(*object.get::<u8>().unwrap(), 7);
  }
}
