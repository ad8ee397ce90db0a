use super::{Condition, ConditionContext};
use crate::filter::{by_key, Filter};
use crate::types::TypeKey;
use std::any::Any;

fn any_assignable(ctx: &ConditionContext<'_>, filter: &Filter) -> bool {
  let container = ctx.container();
  !container.definitions().list(filter).is_empty() || container.singletons().find_first(filter).is_some()
}

/// Matches when some definition or singleton is assignable to `T`.
#[derive(Debug, Clone)]
pub struct OnType {
  filter: Filter,
}

impl OnType {
  pub fn new<T: ?Sized + Any>() -> Self {
    Self::of(TypeKey::of::<T>())
  }

  pub fn of(key: TypeKey) -> Self {
    Self { filter: by_key(key) }
  }
}

impl Condition for OnType {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    any_assignable(ctx, &self.filter)
  }
}

/// Matches while nothing is assignable to `T`.
#[derive(Debug, Clone)]
pub struct OnMissingType {
  filter: Filter,
}

impl OnMissingType {
  pub fn new<T: ?Sized + Any>() -> Self {
    Self::of(TypeKey::of::<T>())
  }

  pub fn of(key: TypeKey) -> Self {
    Self { filter: by_key(key) }
  }
}

impl Condition for OnMissingType {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    !any_assignable(ctx, &self.filter)
  }
}
