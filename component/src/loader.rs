//! Conditional admission of components into a container.

use crate::condition::{Condition, ConditionEvaluator};
use crate::container::Container;
use crate::context::Context;
use crate::definition::{Definition, DefinitionBuilder};
use crate::environment::Environment;
use crate::error::Result;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A definition paired with the conditions gating its admission.
pub struct Component {
  definition: Definition,
  conditions: Vec<Arc<dyn Condition>>,
}

impl Component {
  /// An unconditional component.
  pub fn new(definition: Definition) -> Self {
    Self::with_conditions(definition, Vec::new())
  }

  pub(crate) fn with_conditions(definition: Definition, conditions: Vec<Arc<dyn Condition>>) -> Self {
    Self {
      definition,
      conditions,
    }
  }

  pub fn definition(&self) -> &Definition {
    &self.definition
  }

  pub fn conditions(&self) -> &[Arc<dyn Condition>] {
    &self.conditions
  }
}

impl fmt::Debug for Component {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Component")
      .field("definition", &self.definition)
      .field("conditions", &self.conditions.len())
      .finish()
  }
}

/// The ordered list of components waiting to be admitted.
#[derive(Debug, Default)]
pub struct Components {
  pending: Vec<Component>,
}

impl Components {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds `builder` and appends it.
  pub fn register<P: ?Sized + Any + Send + Sync>(&mut self, builder: DefinitionBuilder<P>) -> Result<()> {
    self.pending.push(builder.into_component()?);
    Ok(())
  }

  pub fn add(&mut self, component: Component) {
    self.pending.push(component);
  }

  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Component> {
    self.pending.iter()
  }
}

impl FromIterator<Component> for Components {
  fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
    Self {
      pending: iter.into_iter().collect(),
    }
  }
}

/// The outcome of [`ConditionalLoader::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
  /// Names admitted, in admission order.
  pub admitted: Vec<String>,
  /// Names whose conditions never matched, in declaration order.
  pub skipped: Vec<String>,
  /// Passes made over a non-empty pending list.
  pub passes: usize,
}

/// Admits components into a container's definition registry.
///
/// Each pass walks the pending components in declaration order and registers
/// every one whose conditions match the registry as it is at that moment, so
/// later components observe earlier admissions. Passes repeat until one
/// admits nothing. Components still pending then are left out without error.
pub struct ConditionalLoader<'a> {
  container: &'a Container,
  environment: &'a dyn Environment,
}

impl<'a> ConditionalLoader<'a> {
  pub fn new(container: &'a Container, environment: &'a dyn Environment) -> Self {
    Self {
      container,
      environment,
    }
  }

  /// Runs admission to its fixed point.
  ///
  /// A duplicate name aborts loading with
  /// [`Error::DuplicateName`](crate::Error::DuplicateName); components admitted
  /// before that stay registered.
  pub fn load(&self, ctx: &Context, components: Components) -> Result<LoadReport> {
    let evaluator = ConditionEvaluator::new(self.container, self.environment);
    let mut pending = components.pending;
    let mut report = LoadReport::default();

    while !pending.is_empty() {
      report.passes += 1;
      let before = pending.len();
      let mut retained = Vec::with_capacity(before);

      for component in pending {
        if !evaluator.evaluate(ctx, &component.conditions) {
          retained.push(component);
          continue;
        }

        let definition = self.container.definitions().register(component.definition)?;
        debug!(name = %definition.name(), pass = report.passes, "component admitted");
        report.admitted.push(definition.name().to_string());
      }

      pending = retained;
      if pending.len() == before {
        break;
      }
    }

    for component in &pending {
      debug!(name = %component.definition.name(), "component skipped, conditions never matched");
      report.skipped.push(component.definition.name().to_string());
    }

    Ok(report)
  }
}
