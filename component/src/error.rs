//! Error types surfaced by the container, its registries and the loader.

use thiserror::Error;

/// An error raised by user code: fallible constructors, init hooks and processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for `fibre_component`.
#[derive(Debug, Error)]
pub enum Error {
  /// No definition or singleton matched the requested name and/or type.
  #[error("not found object with{}", describe(.name, .type_name))]
  NotFound {
    name: Option<String>,
    type_name: Option<&'static str>,
  },

  /// More than one candidate matched and none of them is marked primary.
  #[error(
    "cannot distinguish objects with{} because too many matching found: {}",
    describe(.name, .type_name),
    .candidates.join(", ")
  )]
  Ambiguous {
    name: Option<String>,
    type_name: Option<&'static str>,
    candidates: Vec<String>,
  },

  #[error("object with name '{name}' already exists")]
  DuplicateName { name: String },

  /// The named object was requested again while it was still being prepared.
  #[error("object with name '{name}' is currently in preparation, maybe it has got circular dependency cycle")]
  CircularDependency { name: String },

  #[error("constructor function '{constructor}' returns nil")]
  ConstructorReturnedNil { constructor: String },

  #[error("'{processor}' returns nil object from {phase}")]
  ProcessorReturnedNil {
    processor: String,
    phase: &'static str,
  },

  #[error("at least one filter must be used")]
  MissingFilter,

  #[error("no scope registered for scope name '{scope}'")]
  ScopeNotFound { scope: String },

  #[error("cannot replace '{scope}' scope")]
  ReservedScope { scope: String },

  #[error("processor '{processor}' is already registered")]
  DuplicateProcessor { processor: String },

  /// An option applied while building a definition was invalid.
  #[error("invalid definition '{name}': {reason}")]
  InvalidDefinition { name: String, reason: String },

  #[error("'{profile}' is an invalid profile")]
  InvalidProfile { profile: String },

  #[error("argument {index} of '{name}' cannot be converted into '{expected}'")]
  ArgumentMismatch {
    name: String,
    index: usize,
    expected: &'static str,
  },

  #[error("object of type '{actual}' cannot be converted into '{expected}'")]
  TypeMismatch {
    actual: &'static str,
    expected: &'static str,
  },

  #[error("constructor of '{name}' failed: {source}")]
  Construction {
    name: String,
    #[source]
    source: BoxError,
  },

  #[error("initialization of '{name}' failed: {source}")]
  Initialization {
    name: String,
    #[source]
    source: BoxError,
  },

  #[error("processor '{processor}' failed: {source}")]
  Processor {
    processor: String,
    #[source]
    source: BoxError,
  },

  #[error("failed to parse container configuration: {0}")]
  Config(#[from] serde_yaml::Error),
}

impl Error {
  /// Returns `true` for lookup misses, which callers may recover from.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::NotFound { .. })
  }

  pub fn is_ambiguous(&self) -> bool {
    matches!(self, Error::Ambiguous { .. })
  }

  pub fn is_circular(&self) -> bool {
    matches!(self, Error::CircularDependency { .. })
  }

  /// Returns `true` for errors caused by how components were declared rather
  /// than by resolving them. These are never worth retrying.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      Error::DuplicateName { .. }
        | Error::InvalidDefinition { .. }
        | Error::ReservedScope { .. }
        | Error::DuplicateProcessor { .. }
        | Error::InvalidProfile { .. }
        | Error::Config(_)
    )
  }
}

/// A specialized `Result` type for `fibre_component` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn describe(name: &Option<String>, type_name: &Option<&'static str>) -> String {
  let mut description = String::new();

  if let Some(name) = name {
    description.push_str(&format!(" name '{}'", name));
    if type_name.is_some() {
      description.push_str(" and");
    }
  }

  if let Some(type_name) = type_name {
    description.push_str(&format!(" type '{}'", type_name));
  }

  description
}
