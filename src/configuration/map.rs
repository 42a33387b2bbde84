//! In-memory parameter configuration

use super::{ConfigError, ConfigurationProvider};
use std::collections::BTreeMap;

/// Key/value parameters held in memory
///
/// Keys are stored verbatim (`PERIOD:start`). An optional fallback provider
/// answers every key that is not set here, which is how command-line
/// overrides are layered over a parameter file.
#[derive(Default)]
pub struct MapConfiguration {
    values: BTreeMap<String, String>,
    fallback: Option<Box<dyn ConfigurationProvider>>,
}

impl MapConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Answer missing keys from another provider
    pub fn with_fallback(mut self, fallback: Box<dyn ConfigurationProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapConfiguration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

impl ConfigurationProvider for MapConfiguration {
    fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        if let Some(value) = self.values.get(key) {
            return Ok(value.clone());
        }
        match &self.fallback {
            Some(fallback) => fallback.resolve(key),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    fn describe(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!("{} override(s) over {}", self.values.len(), fallback.describe()),
            None => format!("{} in-memory parameter(s)", self.values.len()),
        }
    }
}
