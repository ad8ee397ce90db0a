//! The environment collaborator: active profiles and resolved properties.

use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Property listing the active profiles, comma separated.
pub const ACTIVE_PROFILES_PROPERTY: &str = "fibre.profiles.active";
/// Property listing the default profiles, comma separated.
pub const DEFAULT_PROFILES_PROPERTY: &str = "fibre.profiles.default";
/// The profile that is the default when nothing else is configured.
pub const DEFAULT_PROFILE: &str = "default";

/// Read access to profiles and properties, as consumed by conditions.
pub trait Environment: Send + Sync {
  fn active_profiles(&self) -> Vec<String>;

  fn default_profiles(&self) -> Vec<String>;

  fn is_profile_active(&self, profile: &str) -> bool {
    self.active_profiles().iter().any(|active| active == profile)
  }

  fn property(&self, name: &str) -> Option<String>;
}

/// An in-memory [`Environment`].
///
/// Unless profiles are set explicitly, the active and default profiles are
/// read once from [`ACTIVE_PROFILES_PROPERTY`] and
/// [`DEFAULT_PROFILES_PROPERTY`] the first time they are needed.
pub struct StandardEnvironment {
  properties: RwLock<HashMap<String, String>>,
  active: RwLock<BTreeSet<String>>,
  defaults: RwLock<BTreeSet<String>>,
  active_seeded: OnceCell<()>,
  defaults_seeded: OnceCell<()>,
}

impl Default for StandardEnvironment {
  fn default() -> Self {
    Self {
      properties: RwLock::new(HashMap::new()),
      active: RwLock::new(BTreeSet::new()),
      defaults: RwLock::new(BTreeSet::from([DEFAULT_PROFILE.to_string()])),
      active_seeded: OnceCell::new(),
      defaults_seeded: OnceCell::new(),
    }
  }
}

impl StandardEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style variant of [`set_property`](Self::set_property).
  pub fn with_property(self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.set_property(name, value);
    self
  }

  pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) {
    self.properties.write().insert(name.into(), value.into());
  }

  /// Replaces the active profiles. Explicit profiles take precedence over
  /// [`ACTIVE_PROFILES_PROPERTY`].
  pub fn set_active_profiles<I, S>(&self, profiles: I) -> Result<()>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let profiles = validate(profiles)?;
    self.active_seeded.get_or_init(|| ());
    *self.active.write() = profiles;
    Ok(())
  }

  /// Adds to the active profiles, after reading the configured ones.
  pub fn add_active_profile(&self, profile: impl Into<String>) -> Result<()> {
    let profiles = validate([profile])?;
    self.seed_active();
    self.active.write().extend(profiles);
    Ok(())
  }

  pub fn set_default_profiles<I, S>(&self, profiles: I) -> Result<()>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let profiles = validate(profiles)?;
    self.defaults_seeded.get_or_init(|| ());
    *self.defaults.write() = profiles;
    Ok(())
  }

  fn seed_active(&self) {
    self.active_seeded.get_or_init(|| {
      if let Some(profiles) = self.profiles_from(ACTIVE_PROFILES_PROPERTY) {
        *self.active.write() = profiles;
      }
    });
  }

  fn seed_defaults(&self) {
    self.defaults_seeded.get_or_init(|| {
      if let Some(profiles) = self.profiles_from(DEFAULT_PROFILES_PROPERTY) {
        *self.defaults.write() = profiles;
      }
    });
  }

  fn profiles_from(&self, property: &str) -> Option<BTreeSet<String>> {
    let value = self.property(property)?;
    let mut profiles = BTreeSet::new();

    for profile in value.split(',').map(str::trim) {
      if profile.is_empty() {
        warn!(property = %property, value = %value, "ignoring blank profile");
        continue;
      }
      profiles.insert(profile.to_string());
    }

    Some(profiles)
  }
}

impl Environment for StandardEnvironment {
  fn active_profiles(&self) -> Vec<String> {
    self.seed_active();
    self.active.read().iter().cloned().collect()
  }

  fn default_profiles(&self) -> Vec<String> {
    self.seed_defaults();
    self.defaults.read().iter().cloned().collect()
  }

  fn is_profile_active(&self, profile: &str) -> bool {
    self.seed_active();
    self.active.read().contains(profile)
  }

  fn property(&self, name: &str) -> Option<String> {
    self.properties.read().get(name).cloned()
  }
}

fn validate<I, S>(profiles: I) -> Result<BTreeSet<String>>
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  profiles
    .into_iter()
    .map(Into::into)
    .map(|profile: String| {
      if profile.trim().is_empty() {
        Err(Error::InvalidProfile { profile })
      } else {
        Ok(profile)
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profiles_are_read_from_properties_once() {
    let env = StandardEnvironment::new().with_property(ACTIVE_PROFILES_PROPERTY, "dev, local");
    assert_eq!(env.active_profiles(), vec!["dev", "local"]);
    assert!(env.is_profile_active("dev"));
    assert!(!env.is_profile_active("default"));

    env.set_property(ACTIVE_PROFILES_PROPERTY, "prod");
    assert!(!env.is_profile_active("prod"));
  }

  #[test]
  fn explicit_profiles_win_over_properties() {
    let env = StandardEnvironment::new().with_property(ACTIVE_PROFILES_PROPERTY, "dev");
    env.set_active_profiles(["prod"]).unwrap();
    assert_eq!(env.active_profiles(), vec!["prod"]);

    env.add_active_profile("eu").unwrap();
    assert_eq!(env.active_profiles(), vec!["eu", "prod"]);
  }

  #[test]
  fn blank_profiles_are_rejected() {
    let env = StandardEnvironment::new();
    let err = env.set_active_profiles(["dev", " "]).unwrap_err();
    assert!(matches!(err, Error::InvalidProfile { .. }));
    assert_eq!(env.default_profiles(), vec![DEFAULT_PROFILE]);
  }
}
