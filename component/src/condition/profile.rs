use super::{Condition, ConditionContext};

/// Matches when every listed profile is active.
#[derive(Debug, Clone)]
pub struct OnProfile {
  profiles: Vec<String>,
}

impl OnProfile {
  pub fn new<I, S>(profiles: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      profiles: profiles.into_iter().map(Into::into).collect(),
    }
  }
}

impl Condition for OnProfile {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    let environment = ctx.environment();
    self
      .profiles
      .iter()
      .all(|profile| environment.is_profile_active(profile))
  }
}
