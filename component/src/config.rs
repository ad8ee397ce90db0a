//! Container configuration, loadable from YAML.

use crate::error::Result;
use serde::Deserialize;

/// How [`Container::list_objects`](crate::Container::list_objects) treats an
/// entry that fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPolicy {
  /// Skip the failing entry and keep listing.
  #[default]
  BestEffort,
  /// Return the first error.
  FailFast,
}

/// Which not-found errors let an optional or [`Value`](crate::Value) argument
/// fall back to `None` or its default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentFallback {
  /// Any not-found error, including one raised while building the dependency.
  #[default]
  AnyMiss,
  /// Only a miss of the argument's own lookup. A dependency that exists but
  /// cannot be built still fails its owner.
  DirectMiss,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  #[serde(default)]
  pub list_policy: ListPolicy,
  #[serde(default)]
  pub argument_fallback: ArgumentFallback,
  /// Install the internal processor checker when loading object processors.
  #[serde(default = "default_processor_check")]
  pub processor_check: bool,
}

fn default_processor_check() -> bool {
  true
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      list_policy: ListPolicy::default(),
      argument_fallback: ArgumentFallback::default(),
      processor_check: default_processor_check(),
    }
  }
}

impl ContainerConfig {
  /// Parses a configuration document such as:
  ///
  /// ```yaml
  /// list_policy: fail_fast
  /// argument_fallback: direct_miss
  /// processor_check: false
  /// ```
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(yaml)?)
  }

  pub fn with_list_policy(mut self, list_policy: ListPolicy) -> Self {
    self.list_policy = list_policy;
    self
  }

  pub fn with_argument_fallback(mut self, argument_fallback: ArgumentFallback) -> Self {
    self.argument_fallback = argument_fallback;
    self
  }

  pub fn with_processor_check(mut self, processor_check: bool) -> Self {
    self.processor_check = processor_check;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn missing_fields_take_defaults() {
    let config = ContainerConfig::from_yaml_str("list_policy: fail_fast").unwrap();
    assert_eq!(
      config,
      ContainerConfig {
        list_policy: ListPolicy::FailFast,
        argument_fallback: ArgumentFallback::AnyMiss,
        processor_check: true,
      }
    );
  }

  #[test]
  fn argument_fallback_is_read_in_snake_case() {
    let config = ContainerConfig::from_yaml_str("argument_fallback: direct_miss").unwrap();
    assert_eq!(config.argument_fallback, ArgumentFallback::DirectMiss);
    assert_eq!(config.list_policy, ListPolicy::BestEffort);
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = ContainerConfig::from_yaml_str("list_polcy: fail_fast").unwrap_err();
    assert!(err.is_configuration());
  }
}
