//! Component definitions: how to construct one named object.

use crate::condition::Condition;
use crate::error::{BoxError, Error, Result};
use crate::inject::{ArgumentKind, ArgumentMismatch, Constructor, Resolved};
use crate::loader::Component;
use crate::processor::{Initialize, ObjectProcessor};
use crate::scope::{PROTOTYPE, SINGLETON};
use crate::types::{Capability, Object, TypeInfo, TypeKey};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type ErasedValue = Arc<dyn Any + Send + Sync>;
type Invoker = Arc<dyn Fn(Vec<Resolved>) -> Result<Option<ErasedValue>, InvokeError> + Send + Sync>;

enum InvokeError {
  Argument(ArgumentMismatch),
  Failed(BoxError),
}

/// Return types accepted from shared and interface constructors.
///
/// `None` stands for a constructor that produced nothing, which the container
/// reports as [`Error::ConstructorReturnedNil`].
pub trait IntoShared<T: ?Sized>: 'static {
  fn into_shared(self) -> Option<Arc<T>>;
}

impl<T: ?Sized + 'static> IntoShared<T> for Arc<T> {
  fn into_shared(self) -> Option<Arc<T>> {
    Some(self)
  }
}

impl<T: ?Sized + 'static> IntoShared<T> for Option<Arc<T>> {
  fn into_shared(self) -> Option<Arc<T>> {
    self
  }
}

/// One constructor parameter, index-aligned with the constructor signature.
#[derive(Debug, Clone)]
pub struct Argument {
  index: usize,
  qualifier: Option<String>,
  required: TypeKey,
  kind: ArgumentKind,
  optional: bool,
}

impl Argument {
  pub fn index(&self) -> usize {
    self.index
  }

  /// The explicit name this argument is wired to, if any.
  pub fn qualifier(&self) -> Option<&str> {
    self.qualifier.as_deref()
  }

  pub fn required_type(&self) -> &TypeKey {
    &self.required
  }

  pub fn kind(&self) -> ArgumentKind {
    self.kind
  }

  pub fn is_optional(&self) -> bool {
    self.optional
  }
}

/// Immutable metadata describing how to construct one named component.
pub struct Definition {
  name: String,
  info: Arc<TypeInfo>,
  scope: String,
  primary: bool,
  priority: i32,
  constructor_name: &'static str,
  arguments: Vec<Argument>,
  invoker: Invoker,
}

impl Definition {
  /// Starts a definition whose constructor returns a plain value.
  pub fn of<T, Args, F>(constructor: F) -> DefinitionBuilder<T>
  where
    T: Any + Send + Sync,
    Args: 'static,
    F: Constructor<Args, T>,
  {
    DefinitionBuilder::new(TypeKey::of::<T>(), constructor, |value: T| {
      Ok(Some(Arc::new(value)))
    })
  }

  /// Starts a definition whose constructor may fail.
  pub fn fallible<T, E, Args, F>(constructor: F) -> DefinitionBuilder<T>
  where
    T: Any + Send + Sync,
    E: Into<BoxError> + 'static,
    Args: 'static,
    F: Constructor<Args, Result<T, E>>,
  {
    DefinitionBuilder::new(TypeKey::of::<T>(), constructor, |result: Result<T, E>| {
      result.map(|value| Some(Arc::new(value))).map_err(Into::into)
    })
  }

  /// Starts a definition whose constructor returns `Arc<T>` (or `Option<Arc<T>>`).
  pub fn shared<T, R, Args, F>(constructor: F) -> DefinitionBuilder<T>
  where
    T: Any + Send + Sync,
    R: IntoShared<T>,
    Args: 'static,
    F: Constructor<Args, R>,
  {
    DefinitionBuilder::new(TypeKey::pointer::<T>(), constructor, |produced: R| {
      Ok(produced.into_shared())
    })
  }

  /// Starts a definition whose constructor returns `Arc<dyn Trait>` (or an
  /// `Option` of it).
  pub fn interface<I, R, Args, F>(constructor: F) -> DefinitionBuilder<I>
  where
    I: ?Sized + Any + Send + Sync,
    R: IntoShared<I>,
    Args: 'static,
    F: Constructor<Args, R>,
  {
    DefinitionBuilder::new(TypeKey::interface::<I>(), constructor, |produced: R| {
      Ok(produced.into_shared())
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn type_info(&self) -> &TypeInfo {
    &self.info
  }

  pub fn type_key(&self) -> &TypeKey {
    self.info.key()
  }

  pub fn scope(&self) -> &str {
    &self.scope
  }

  pub fn is_singleton(&self) -> bool {
    self.scope == SINGLETON
  }

  pub fn is_prototype(&self) -> bool {
    self.scope == PROTOTYPE
  }

  pub fn is_primary(&self) -> bool {
    self.primary
  }

  pub fn priority(&self) -> i32 {
    self.priority
  }

  pub fn constructor_name(&self) -> &'static str {
    self.constructor_name
  }

  pub fn arguments(&self) -> &[Argument] {
    &self.arguments
  }

  /// Invokes the constructor with already resolved arguments.
  pub(crate) fn instantiate(&self, arguments: Vec<Resolved>) -> Result<Object> {
    match (self.invoker)(arguments) {
      Ok(Some(value)) => Ok(Object::from_parts(value, Arc::clone(&self.info))),
      Ok(None) => Err(Error::ConstructorReturnedNil {
        constructor: self.constructor_name.to_string(),
      }),
      Err(InvokeError::Argument(mismatch)) => Err(Error::ArgumentMismatch {
        name: self.name.clone(),
        index: mismatch.index,
        expected: mismatch.expected,
      }),
      Err(InvokeError::Failed(source)) => Err(Error::Construction {
        name: self.name.clone(),
        source,
      }),
    }
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Definition")
      .field("name", &self.name)
      .field("type", &self.info.name())
      .field("scope", &self.scope)
      .field("primary", &self.primary)
      .field("priority", &self.priority)
      .field("arguments", &self.arguments)
      .finish_non_exhaustive()
  }
}

/// A builder for [`Definition`]s.
///
/// Options never fail on their own; the first invalid option is reported by
/// [`build`](DefinitionBuilder::build) as [`Error::InvalidDefinition`].
pub struct DefinitionBuilder<P: ?Sized> {
  name: String,
  info: TypeInfo,
  scope: String,
  primary: bool,
  priority: i32,
  constructor_name: &'static str,
  arguments: Vec<Argument>,
  invoker: Invoker,
  conditions: Vec<Arc<dyn Condition>>,
  problems: Vec<String>,
  _produces: PhantomData<fn() -> Arc<P>>,
}

impl<P: ?Sized + Any + Send + Sync> DefinitionBuilder<P> {
  fn new<R, Args, F, G>(key: TypeKey, constructor: F, produce: G) -> Self
  where
    R: 'static,
    Args: 'static,
    F: Constructor<Args, R>,
    G: Fn(R) -> Result<Option<Arc<P>>, BoxError> + Send + Sync + 'static,
  {
    let arguments = F::parameters()
      .into_iter()
      .enumerate()
      .map(|(index, parameter)| Argument {
        index,
        qualifier: None,
        required: parameter.required,
        kind: parameter.kind,
        optional: parameter.kind == ArgumentKind::Optional,
      })
      .collect();

    let invoker: Invoker = Arc::new(move |arguments| {
      let produced = constructor
        .construct(arguments)
        .map_err(InvokeError::Argument)?;
      let shared = produce(produced).map_err(InvokeError::Failed)?;
      Ok(shared.map(|value| Arc::new(value) as ErasedValue))
    });

    Self {
      name: lower_camel_case(key.simple_name()),
      info: TypeInfo::new(key),
      scope: SINGLETON.to_string(),
      primary: false,
      priority: 0,
      constructor_name: type_name::<F>(),
      arguments,
      invoker,
      conditions: Vec::new(),
      problems: Vec::new(),
      _produces: PhantomData,
    }
  }

  /// Overrides the default name. Blank names are ignored.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    if !name.trim().is_empty() {
      self.name = name;
    }
    self
  }

  /// Sets the scope. A blank scope means singleton.
  pub fn scoped(mut self, scope: impl Into<String>) -> Self {
    let scope = scope.into();
    self.scope = if scope.trim().is_empty() {
      SINGLETON.to_string()
    } else {
      scope
    };
    self
  }

  /// Marks this definition as the one to pick when a type lookup matches
  /// several candidates.
  pub fn primary(mut self) -> Self {
    self.primary = true;
    self
  }

  /// Orders this definition among others matching the same lookup; lower
  /// values come first.
  pub fn priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  /// Wires the argument at `index` to the component named `name`.
  pub fn qualifier_at(mut self, index: usize, name: impl Into<String>) -> Self {
    match self.arguments.get_mut(index) {
      Some(argument) => argument.qualifier = Some(name.into()),
      None => self
        .problems
        .push(format!("could not find any input at index {}", index)),
    }
    self
  }

  /// Wires every argument requiring `T` to the component named `name`.
  pub fn qualifier<T: ?Sized + Any>(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    let mut exists = false;

    for argument in self.arguments_requiring(TypeId::of::<T>()) {
      argument.qualifier = Some(name.clone());
      exists = true;
    }

    if !exists {
      self
        .problems
        .push(format!("could not find any input of type {}", type_name::<T>()));
    }
    self
  }

  /// Lets the argument at `index` be absent when nothing matches it.
  pub fn optional_at(mut self, index: usize) -> Self {
    match self.arguments.get_mut(index) {
      Some(argument) if argument.kind.can_be_absent() => argument.optional = true,
      Some(argument) => {
        let reason = format!(
          "input at index {} of type {} cannot be absent",
          index,
          argument.required.name()
        );
        self.problems.push(reason);
      }
      None => self
        .problems
        .push(format!("could not find any input at index {}", index)),
    }
    self
  }

  /// Lets every argument requiring `T` be absent when nothing matches it.
  pub fn optional<T: ?Sized + Any>(mut self) -> Self {
    let mut exists = false;
    let mut rejected = false;

    for argument in self.arguments_requiring(TypeId::of::<T>()) {
      exists = true;
      if argument.kind.can_be_absent() {
        argument.optional = true;
      } else {
        rejected = true;
      }
    }

    if !exists {
      self
        .problems
        .push(format!("could not find any input of type {}", type_name::<T>()));
    } else if rejected {
      self
        .problems
        .push(format!("input of type {} cannot be absent", type_name::<T>()));
    }
    self
  }

  /// Declares that the produced object can be viewed as `I`.
  pub fn implements<I: ?Sized + Any + Send + Sync>(mut self, cast: fn(Arc<P>) -> Arc<I>) -> Self {
    self.info.add_capability(Capability::new(cast));
    self
  }

  /// Only admit this definition when `condition` matches.
  pub fn conditional_on(mut self, condition: impl Condition + 'static) -> Self {
    self.conditions.push(Arc::new(condition));
    self
  }

  pub fn build(self) -> Result<Definition> {
    self.into_parts().map(|(definition, _)| definition)
  }

  /// Builds the definition together with its conditions.
  pub fn into_component(self) -> Result<Component> {
    let (definition, conditions) = self.into_parts()?;
    Ok(Component::with_conditions(definition, conditions))
  }

  fn into_parts(self) -> Result<(Definition, Vec<Arc<dyn Condition>>)> {
    if !self.problems.is_empty() {
      return Err(Error::InvalidDefinition {
        name: self.name,
        reason: self.problems.join("; "),
      });
    }

    let definition = Definition {
      name: self.name,
      info: Arc::new(self.info),
      scope: self.scope,
      primary: self.primary,
      priority: self.priority,
      constructor_name: self.constructor_name,
      arguments: self.arguments,
      invoker: self.invoker,
    };

    Ok((definition, self.conditions))
  }

  fn arguments_requiring(&mut self, id: TypeId) -> impl Iterator<Item = &mut Argument> {
    self
      .arguments
      .iter_mut()
      .filter(move |argument| argument.required.id() == id)
  }
}

impl<P: Initialize + Any> DefinitionBuilder<P> {
  /// Declares that the produced object initializes itself through
  /// [`Initialize::init`] between the two processor phases.
  pub fn initializing(self) -> Self {
    self.implements::<dyn Initialize>(as_initialize::<P>)
  }
}

impl<P: ObjectProcessor + Any> DefinitionBuilder<P> {
  /// Declares that the produced object is an [`ObjectProcessor`], so that
  /// [`Container::load_object_processors`](crate::Container::load_object_processors)
  /// installs it.
  pub fn processor(self) -> Self {
    self.implements::<dyn ObjectProcessor>(as_processor::<P>)
  }
}

impl<P: ?Sized> fmt::Debug for DefinitionBuilder<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DefinitionBuilder")
      .field("name", &self.name)
      .field("type", &self.info.name())
      .field("scope", &self.scope)
      .field("conditions", &self.conditions.len())
      .finish_non_exhaustive()
  }
}

fn as_initialize<P: Initialize + 'static>(it: Arc<P>) -> Arc<dyn Initialize> {
  it
}

fn as_processor<P: ObjectProcessor + 'static>(it: Arc<P>) -> Arc<dyn ObjectProcessor> {
  it
}

fn lower_camel_case(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_lowercase().chain(chars).collect(),
    None => String::new(),
  }
}
