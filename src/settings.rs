//! Layered configuration lookup: environment variables first, then Git config.

// std
use std::{env, process::Command};
// self
use crate::_prelude::*;

/// Layered settings provider consulted for per-provider overrides.
pub trait Settings
where
	Self: Send + Sync,
{
	/// Returns the first non-empty value found for the environment variable
	/// `env_key` or the Git configuration entry `credential.<config_key>`.
	fn try_get(&self, env_key: &str, config_key: &str) -> Option<String>;
}

/// Production settings source: process environment, then `git config --get`.
#[derive(Clone, Debug, Default)]
pub struct EnvSettings;
impl EnvSettings {
	fn git_config(config_key: &str) -> Option<String> {
		let output = Command::new("git")
			.args(["config", "--get", &format!("credential.{config_key}")])
			.output()
			.ok()?;

		if !output.status.success() {
			return None;
		}

		let value = String::from_utf8(output.stdout).ok()?;
		let value = value.trim();

		(!value.is_empty()).then(|| value.to_owned())
	}
}
impl Settings for EnvSettings {
	fn try_get(&self, env_key: &str, config_key: &str) -> Option<String> {
		if let Ok(value) = env::var(env_key)
			&& !value.is_empty()
		{
			return Some(value);
		}

		Self::git_config(config_key)
	}
}

/// Fixed-map settings double for tests.
#[derive(Clone, Debug, Default)]
pub struct MapSettings(HashMap<String, String>);
impl MapSettings {
	/// Builds the double from `(key, value)` pairs; keys match either lookup name.
	pub fn new(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
		Self(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl Settings for MapSettings {
	fn try_get(&self, env_key: &str, config_key: &str) -> Option<String> {
		self.0.get(env_key).or_else(|| self.0.get(config_key)).cloned()
	}
}
