//! The main `Container` struct: resolution, construction and the processor
//! pipeline.

use crate::config::{ArgumentFallback, ContainerConfig, ListPolicy};
use crate::core::PreparationGuard;
use crate::definition::{Argument, Definition, DefinitionBuilder};
use crate::error::{Error, Result};
use crate::filter::{by_key, by_name, by_type, Filter};
use crate::inject::{ArgumentKind, Resolved};
use crate::processor::{Initialize, ObjectProcessor, ProcessorChecker};
use crate::registry::DefinitionRegistry;
use crate::scope::{PrototypeScope, Scope, SingletonScope, PROTOTYPE, SINGLETON};
use crate::singleton::SingletonRegistry;
use crate::types::Object;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct Processors {
  list: Vec<Arc<dyn ObjectProcessor>>,
  names: HashSet<&'static str>,
}

/// The Inversion of Control (IoC) container.
///
/// Holds the component definitions, the realized singletons, the registered
/// scopes and the object processors. Thread-safe: any number of threads may
/// resolve objects concurrently, and a singleton is constructed at most once
/// however many threads ask for it at the same time.
pub struct Container {
  id: u64,
  config: ContainerConfig,
  definitions: DefinitionRegistry,
  singletons: Arc<SingletonRegistry>,
  singleton_scope: SingletonScope,
  prototype_scope: PrototypeScope,
  scopes: RwLock<HashMap<String, Arc<dyn Scope>>>,
  processors: RwLock<Processors>,
  processor_count: Arc<AtomicUsize>,
}

impl Default for Container {
  fn default() -> Self {
    Self::with_config(ContainerConfig::default())
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: ContainerConfig) -> Self {
    let singletons = Arc::new(SingletonRegistry::new());
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      config,
      definitions: DefinitionRegistry::new(),
      singleton_scope: SingletonScope::new(Arc::clone(&singletons)),
      singletons,
      prototype_scope: PrototypeScope,
      scopes: RwLock::new(HashMap::new()),
      processors: RwLock::new(Processors::default()),
      processor_count: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  pub fn definitions(&self) -> &DefinitionRegistry {
    &self.definitions
  }

  pub fn singletons(&self) -> &SingletonRegistry {
    &self.singletons
  }

  // --- Registration ---

  /// Builds and registers a definition.
  pub fn register<P: ?Sized + Any + Send + Sync>(&self, builder: DefinitionBuilder<P>) -> Result<Arc<Definition>> {
    self.definitions.register(builder.build()?)
  }

  /// Registers an already constructed object as a singleton.
  pub fn register_singleton(&self, name: impl Into<String>, object: Object) -> Result<()> {
    self.singletons.register(name, object)
  }

  /// Registers a custom scope under `name`, replacing any custom scope of the
  /// same name.
  ///
  /// # Panics
  ///
  /// Panics if `name` is blank.
  pub fn register_scope(&self, name: &str, scope: Arc<dyn Scope>) -> Result<()> {
    if name.trim().is_empty() {
      panic!("scope name cannot be empty");
    }

    if name == SINGLETON || name == PROTOTYPE {
      return Err(Error::ReservedScope {
        scope: name.to_string(),
      });
    }

    self.scopes.write().insert(name.to_string(), scope);
    Ok(())
  }

  /// Names of the registered custom scopes, sorted.
  pub fn scope_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.scopes.read().keys().cloned().collect();
    names.sort_unstable();
    names
  }

  /// Looks up a custom scope. The built-in scopes are not registered here.
  pub fn find_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
    self.scopes.read().get(name).cloned()
  }

  /// Appends a processor to the pipeline.
  ///
  /// Fails with [`Error::DuplicateProcessor`] if a processor with the same
  /// [`processor_name`](ObjectProcessor::processor_name) is registered.
  pub fn add_object_processor(&self, processor: Arc<dyn ObjectProcessor>) -> Result<()> {
    let name = processor.processor_name();
    let mut processors = self.processors.write();

    if !processors.names.insert(name) {
      return Err(Error::DuplicateProcessor {
        processor: name.to_string(),
      });
    }

    processors.list.push(processor);
    self.processor_count.fetch_add(1, Ordering::AcqRel);
    debug!(processor = name, "object processor registered");
    Ok(())
  }

  pub fn object_processor_count(&self) -> usize {
    self.processor_count.load(Ordering::Acquire)
  }

  /// Instantiates every definition providing `dyn ObjectProcessor`, in
  /// definition list order, and adds it to the pipeline.
  ///
  /// With [`ContainerConfig::processor_check`] set, an internal checker is
  /// installed first that reports objects created before the pipeline is
  /// complete. Processors that are already installed are skipped, so calling
  /// this again only adds processors defined since the last call.
  pub fn load_object_processors(&self) -> Result<()> {
    let definitions = self.definitions.list(&by_type::<dyn ObjectProcessor>());

    let checker_name = type_name::<ProcessorChecker>();
    if self.config.processor_check && !self.processors.read().names.contains(checker_name) {
      let expected = self.object_processor_count() + definitions.len() + 1;
      self.add_object_processor(Arc::new(ProcessorChecker::new(
        Arc::clone(&self.processor_count),
        expected,
      )))?;
    }

    for definition in definitions {
      let processor = self.resolve(&definition).and_then(cast::<dyn ObjectProcessor>)?;
      if self.processors.read().names.contains(processor.processor_name()) {
        trace!(processor = processor.processor_name(), "object processor already installed");
        continue;
      }
      self.add_object_processor(processor)?;
    }

    Ok(())
  }

  // --- Queries ---

  /// Whether a definition or a singleton is registered under `name`.
  pub fn contains_object(&self, name: &str) -> bool {
    self.definitions.contains(name) || self.singletons.contains(name)
  }

  /// Whether `name` is a singleton, either registered directly or defined
  /// with singleton scope.
  pub fn is_singleton(&self, name: &str) -> bool {
    self.singletons.contains(name)
      || self
        .definitions
        .get(name)
        .map_or(false, |definition| definition.is_singleton())
  }

  pub fn is_prototype(&self, name: &str) -> bool {
    self
      .definitions
      .get(name)
      .map_or(false, |definition| definition.is_prototype())
  }

  // --- Resolution ---

  /// Resolves exactly one object matching `filter`.
  ///
  /// Realized singletons are returned directly. Otherwise the single matching
  /// definition is resolved through its scope, constructing the object and
  /// its dependencies as needed.
  pub fn get_object(&self, filter: &Filter) -> Result<Object> {
    if filter.is_empty() {
      return Err(Error::MissingFilter);
    }

    // An ambiguity among realized singletons may still be settled by a
    // primary definition.
    let ambiguity = match self.singletons.find(filter) {
      Ok(object) => return Ok(object),
      Err(err) if err.is_ambiguous() => Some(err),
      Err(err) if err.is_not_found() => None,
      Err(err) => return Err(err),
    };

    match self.definitions.find(filter) {
      Ok(definition) => self.resolve(&definition),
      Err(err) if err.is_not_found() => Err(ambiguity.unwrap_or(err)),
      Err(err) => Err(err),
    }
  }

  /// Resolves every object matching `filter`: the realized singletons plus
  /// each matching definition not realized yet.
  ///
  /// Per-entry failures follow [`ContainerConfig::list_policy`].
  pub fn list_objects(&self, filter: &Filter) -> Result<Vec<Object>> {
    let (mut objects, realized) = self.singletons.snapshot(filter);

    for definition in self.definitions.list(filter) {
      if definition.is_singleton() && realized.contains(definition.name()) {
        continue;
      }

      match self.resolve(&definition) {
        Ok(object) => objects.push(object),
        Err(err) => match self.config.list_policy {
          ListPolicy::FailFast => return Err(err),
          ListPolicy::BestEffort if err.is_not_found() => {
            debug!(name = %definition.name(), error = %err, "skipping object while listing");
          }
          ListPolicy::BestEffort => {
            warn!(name = %definition.name(), error = %err, "skipping object while listing");
          }
        },
      }
    }

    Ok(objects)
  }

  /// Resolves the single object assignable to `T`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.get_object(&by_type::<T>()).and_then(cast::<T>)
  }

  /// Resolves the object named `name`, which must be assignable to `T`.
  pub fn get_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self
      .get_object(&by_name(name).and(by_type::<T>()))
      .and_then(cast::<T>)
  }

  /// Resolves every object assignable to `T`.
  pub fn list<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
    self
      .list_objects(&by_type::<T>())?
      .into_iter()
      .map(cast::<T>)
      .collect()
  }

  // --- PRIVATE HELPERS ---

  fn resolve(&self, definition: &Arc<Definition>) -> Result<Object> {
    let name = definition.name();
    let provider = || self.create_object(definition);

    match definition.scope() {
      SINGLETON => self.singleton_scope.get_object(name, &provider),
      PROTOTYPE => {
        let _guard = PreparationGuard::enter(self.id, name)?;
        self.prototype_scope.get_object(name, &provider)
      }
      scope_name => {
        let scope = self.find_scope(scope_name).ok_or_else(|| Error::ScopeNotFound {
          scope: scope_name.to_string(),
        })?;
        let _guard = PreparationGuard::enter(self.id, name)?;
        scope.get_object(name, &provider)
      }
    }
  }

  fn create_object(&self, definition: &Definition) -> Result<Object> {
    let mut arguments = Vec::with_capacity(definition.arguments().len());
    for argument in definition.arguments() {
      arguments.push(self.resolve_argument(definition, argument)?);
    }

    let object = definition.instantiate(arguments)?;
    debug!(name = %definition.name(), scope = %definition.scope(), "object created");
    self.initialize(definition.name(), object)
  }

  fn resolve_argument(&self, definition: &Definition, argument: &Argument) -> Result<Resolved> {
    trace!(
      name = %definition.name(),
      index = argument.index(),
      required = %argument.required_type(),
      qualifier = ?argument.qualifier(),
      "resolving argument"
    );

    if argument.kind() == ArgumentKind::Collection {
      return self
        .list_objects(&by_key(*argument.required_type()))
        .map(Resolved::List);
    }

    let filter = match argument.qualifier() {
      Some(qualifier) => by_name(qualifier),
      None => by_key(*argument.required_type()),
    };

    match self.get_object(&filter) {
      Ok(object) => Ok(Resolved::Object(object)),
      Err(err) if self.may_fall_back(&filter, &err) => match argument.kind() {
        ArgumentKind::Value => Ok(Resolved::Zero),
        _ if argument.is_optional() => Ok(Resolved::Absent),
        _ => Err(err),
      },
      Err(err) => Err(err),
    }
  }

  fn may_fall_back(&self, filter: &Filter, err: &Error) -> bool {
    match self.config.argument_fallback {
      ArgumentFallback::AnyMiss => err.is_not_found(),
      ArgumentFallback::DirectMiss => filter.is_missing(err),
    }
  }

  /// Runs the processor pipeline around the object's own initialization.
  fn initialize(&self, name: &str, object: Object) -> Result<Object> {
    // Snapshot so processors can resolve objects (and register processors)
    // without holding the lock.
    let processors = self.processors.read().list.clone();

    let mut object = object;
    for processor in &processors {
      trace!(name = %name, processor = processor.processor_name(), "before init");
      object = process(processor.as_ref(), object, "before init", |processor, object| {
        processor.process_before_init(object)
      })?;
    }

    if let Some(initializer) = object.get::<dyn Initialize>() {
      initializer.init().map_err(|source| Error::Initialization {
        name: name.to_string(),
        source,
      })?;
    }

    for processor in &processors {
      trace!(name = %name, processor = processor.processor_name(), "after init");
      object = process(processor.as_ref(), object, "after init", |processor, object| {
        processor.process_after_init(object)
      })?;
    }

    Ok(object)
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("definitions", &self.definitions.count())
      .field("singletons", &self.singletons.count())
      .field("scopes", &self.scope_names())
      .field("processors", &self.object_processor_count())
      .finish()
  }
}

fn process<F>(processor: &dyn ObjectProcessor, object: Object, phase: &'static str, hook: F) -> Result<Object>
where
  F: FnOnce(&dyn ObjectProcessor, Object) -> Result<Option<Object>, crate::error::BoxError>,
{
  match hook(processor, object) {
    Ok(Some(object)) => Ok(object),
    Ok(None) => Err(Error::ProcessorReturnedNil {
      processor: processor.processor_name().to_string(),
      phase,
    }),
    Err(source) => Err(Error::Processor {
      processor: processor.processor_name().to_string(),
      source,
    }),
  }
}

fn cast<T: ?Sized + Any + Send + Sync>(object: Object) -> Result<Arc<T>> {
  object.get::<T>().ok_or_else(|| Error::TypeMismatch {
    actual: object.type_name(),
    expected: type_name::<T>(),
  })
}
