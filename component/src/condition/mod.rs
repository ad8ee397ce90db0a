//! Predicates that gate whether a component is admitted into a container.
//!
//! Conditions are pure: they read the container's definitions and singletons
//! and the [`Environment`], and never mutate what they inspect. A condition
//! that cannot decide must answer `false`.

mod kind;
mod object;
mod profile;
mod property;

pub use kind::{OnMissingType, OnType};
pub use object::{OnMissingObject, OnObject};
pub use profile::OnProfile;
pub use property::OnProperty;

use crate::container::Container;
use crate::context::Context;
use crate::environment::Environment;
use std::sync::Arc;

/// A predicate over a [`ConditionContext`].
///
/// Any `Fn(&ConditionContext<'_>) -> bool` closure is a condition too.
pub trait Condition: Send + Sync {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool;
}

impl<F> Condition for F
where
  F: Fn(&ConditionContext<'_>) -> bool + Send + Sync,
{
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    self(ctx)
  }
}

/// What a condition may look at.
#[derive(Clone, Copy)]
pub struct ConditionContext<'a> {
  ctx: &'a Context,
  container: &'a Container,
  environment: &'a dyn Environment,
}

impl<'a> ConditionContext<'a> {
  pub fn new(ctx: &'a Context, container: &'a Container, environment: &'a dyn Environment) -> Self {
    Self {
      ctx,
      container,
      environment,
    }
  }

  /// The ambient invocation context.
  pub fn context(&self) -> &'a Context {
    self.ctx
  }

  pub fn container(&self) -> &'a Container {
    self.container
  }

  pub fn environment(&self) -> &'a dyn Environment {
    self.environment
  }
}

/// Evaluates condition lists against one container and environment.
pub struct ConditionEvaluator<'a> {
  container: &'a Container,
  environment: &'a dyn Environment,
}

impl<'a> ConditionEvaluator<'a> {
  pub fn new(container: &'a Container, environment: &'a dyn Environment) -> Self {
    Self {
      container,
      environment,
    }
  }

  /// `true` when every condition matches. An empty list is unconditional; a
  /// cancelled or expired context fails closed.
  pub fn evaluate(&self, ctx: &Context, conditions: &[Arc<dyn Condition>]) -> bool {
    if conditions.is_empty() {
      return true;
    }

    if ctx.is_done() {
      return false;
    }

    let condition_ctx = ConditionContext::new(ctx, self.container, self.environment);
    conditions
      .iter()
      .all(|condition| condition.matches(&condition_ctx))
  }
}
