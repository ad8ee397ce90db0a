//! The name-keyed store of component definitions.

use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::filter::Filter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

struct Registered {
  definition: Arc<Definition>,
  sequence: u64,
}

/// A thread-safe map from component name to [`Definition`].
///
/// Names are unique. Lookups by type return every assignable definition,
/// ordered by priority and then by registration order.
#[derive(Default)]
pub struct DefinitionRegistry {
  definitions: DashMap<String, Registered>,
  sequence: AtomicU64,
}

impl DefinitionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a definition under its name.
  ///
  /// Fails with [`Error::DuplicateName`] if the name is already taken.
  pub fn register(&self, definition: Definition) -> Result<Arc<Definition>> {
    match self.definitions.entry(definition.name().to_string()) {
      Entry::Occupied(entry) => Err(Error::DuplicateName {
        name: entry.key().clone(),
      }),
      Entry::Vacant(entry) => {
        let definition = Arc::new(definition);
        trace!(name = %definition.name(), scope = %definition.scope(), "definition registered");
        entry.insert(Registered {
          definition: Arc::clone(&definition),
          sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        });
        Ok(definition)
      }
    }
  }

  /// Removes a definition, returning it if present.
  pub fn remove(&self, name: &str) -> Option<Arc<Definition>> {
    self
      .definitions
      .remove(name)
      .map(|(_, registered)| registered.definition)
  }

  pub fn get(&self, name: &str) -> Option<Arc<Definition>> {
    self
      .definitions
      .get(name)
      .map(|registered| Arc::clone(&registered.definition))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.definitions.contains_key(name)
  }

  pub fn count(&self) -> usize {
    self.definitions.len()
  }

  /// Every definition matching `filter`, lowest priority value first, ties
  /// broken by registration order.
  pub fn list(&self, filter: &Filter) -> Vec<Arc<Definition>> {
    let mut matching: Vec<(i32, u64, Arc<Definition>)> = match filter.name() {
      Some(name) => self
        .definitions
        .get(name)
        .filter(|registered| filter.matches(name, registered.definition.type_info()))
        .map(|registered| vec![Self::sort_entry(&registered)])
        .unwrap_or_default(),
      None => self
        .definitions
        .iter()
        .filter(|entry| filter.matches(entry.key(), entry.definition.type_info()))
        .map(|entry| Self::sort_entry(entry.value()))
        .collect(),
    };

    matching.sort_by_key(|(priority, sequence, _)| (*priority, *sequence));
    matching
      .into_iter()
      .map(|(_, _, definition)| definition)
      .collect()
  }

  /// Finds the single definition matching `filter`.
  ///
  /// When several match, the one marked primary wins; without exactly one
  /// primary candidate the lookup is ambiguous.
  pub fn find(&self, filter: &Filter) -> Result<Arc<Definition>> {
    if filter.is_empty() {
      return Err(Error::MissingFilter);
    }

    let mut candidates = self.list(filter);
    match candidates.len() {
      0 => Err(filter.not_found()),
      1 => Ok(candidates.remove(0)),
      _ => {
        let mut primaries = candidates.iter().filter(|definition| definition.is_primary());
        match (primaries.next(), primaries.next()) {
          (Some(primary), None) => Ok(Arc::clone(primary)),
          _ => Err(filter.ambiguous(
            candidates
              .iter()
              .map(|definition| definition.name().to_string())
              .collect(),
          )),
        }
      }
    }
  }

  /// Like [`find`](Self::find) but tolerates ambiguity, returning the first
  /// match in list order.
  pub fn find_first(&self, filter: &Filter) -> Option<Arc<Definition>> {
    self.list(filter).into_iter().next()
  }

  pub fn names(&self) -> Vec<String> {
    self
      .list(&Filter::default())
      .iter()
      .map(|definition| definition.name().to_string())
      .collect()
  }

  fn sort_entry(registered: &Registered) -> (i32, u64, Arc<Definition>) {
    (
      registered.definition.priority(),
      registered.sequence,
      Arc::clone(&registered.definition),
    )
  }
}
