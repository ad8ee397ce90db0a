use super::{Condition, ConditionContext};

/// Matches on the value of an environment property.
///
/// A present property matches its expected value when one is set, and
/// otherwise any value but `false`. A missing property matches only when
/// `match_if_missing` is set.
#[derive(Debug, Clone)]
pub struct OnProperty {
  name: String,
  prefix: Option<String>,
  value: Option<String>,
  match_if_missing: bool,
}

impl OnProperty {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      prefix: None,
      value: None,
      match_if_missing: false,
    }
  }

  /// Prepends `prefix` and a `.` to the property name.
  pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = Some(prefix.into());
    self
  }

  pub fn having_value(mut self, value: impl Into<String>) -> Self {
    self.value = Some(value.into());
    self
  }

  pub fn match_if_missing(mut self, match_if_missing: bool) -> Self {
    self.match_if_missing = match_if_missing;
    self
  }

  fn property_name(&self) -> String {
    match &self.prefix {
      Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix.trim_end_matches('.'), self.name),
      _ => self.name.clone(),
    }
  }
}

impl Condition for OnProperty {
  fn matches(&self, ctx: &ConditionContext<'_>) -> bool {
    match ctx.environment().property(&self.property_name()) {
      Some(actual) => match &self.value {
        Some(expected) => actual == *expected,
        None => !actual.trim().eq_ignore_ascii_case("false"),
      },
      None => self.match_if_missing,
    }
  }
}
