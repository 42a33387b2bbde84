//! YAML-backed parameter configuration

use super::{split_key, ConfigError, ConfigurationProvider};
use regex::Regex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Parameters loaded from a YAML document
///
/// ```yaml
/// PERIOD:
///   start: "201709"
///   stop: "201801"
/// SCRIPT:
///   interpreter: Rscript
///   code_root: ${PATHS:root}/r/
/// PATHS:
///   root: /opt/jobs
/// ```
///
/// `PERIOD:start` resolves to `201709`. Values may reference other keys with
/// `${SECTION:key}`; references are expanded recursively.
#[derive(Debug, Clone)]
pub struct YamlConfiguration {
    root: Value,
    source: Option<PathBuf>,
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("reference pattern is valid"))
}

impl YamlConfiguration {
    /// Load parameters from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse parameters from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(yaml)?;
        Ok(Self { root, source: None })
    }

    /// File the parameters were loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn lookup_raw(&self, key: &str) -> Result<String, ConfigError> {
        let node = match split_key(key) {
            (Some(section), name) => self.root.get(section).and_then(|s| s.get(name)),
            (None, name) => self.root.get(name),
        };

        match node {
            None | Some(Value::Null) => Err(ConfigError::Missing(key.to_string())),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(_) => Err(ConfigError::NotScalar(key.to_string())),
        }
    }

    fn resolve_with(&self, key: &str, stack: &mut Vec<String>) -> Result<String, ConfigError> {
        if stack.iter().any(|k| k == key) {
            stack.push(key.to_string());
            return Err(ConfigError::Cycle(stack.join(" -> ")));
        }

        stack.push(key.to_string());
        let raw = self.lookup_raw(key)?;
        let value = self.expand(&raw, stack)?;
        stack.pop();

        Ok(value)
    }

    fn expand(&self, raw: &str, stack: &mut Vec<String>) -> Result<String, ConfigError> {
        if !raw.contains("${") {
            return Ok(raw.to_string());
        }

        let mut expanded = String::with_capacity(raw.len());
        let mut last = 0;
        for caps in reference_pattern().captures_iter(raw) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            expanded.push_str(&raw[last..whole.start()]);
            expanded.push_str(&self.resolve_with(reference.as_str().trim(), stack)?);
            last = whole.end();
        }
        expanded.push_str(&raw[last..]);

        Ok(expanded)
    }
}

impl ConfigurationProvider for YamlConfiguration {
    fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.resolve_with(key, &mut Vec::new())?;
        debug!(key, value = %value, "resolved parameter");
        Ok(value)
    }

    fn describe(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "inline yaml".to_string(),
        }
    }
}
