use super::{Condition, ConditionContext};

/// Matches when a definition or singleton named `name` exists.
#[derive(Debug, Clone)]
pub struct OnObject {
  name: String,
}

impl OnObject {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl Condition for OnObject {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    ctx.container().contains_object(&self.name)
  }
}

/// Matches while neither a definition nor a singleton named `name` exists.
#[derive(Debug, Clone)]
pub struct OnMissingObject {
  name: String,
}

impl OnMissingObject {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl Condition for OnMissingObject {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    !ctx.container().contains_object(&self.name)
  }
}
