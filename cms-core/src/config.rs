//! # Configuration
//!
//! A small string key/value store. Defaults are written in code with
//! [`CmsConfig::set`], then environment variables override them:
//!
//! ```rust
//! use cms_core::CmsConfig;
//!
//! let mut config = CmsConfig::new();
//! config.set("paginate.default", "10");
//! config.load_env_from("CMS__", [("CMS__PAGINATE__DEFAULT", "25")]);
//!
//! assert_eq!(config.get("paginate.default"), Some("25"));
//! ```
//!
//! `CMS__HTTP__PORT=8080` becomes `http.port = 8080`.

use std::collections::HashMap;

pub const ENV_PREFIX: &str = "CMS__";

#[derive(Debug, Default, Clone)]
pub struct CmsConfig {
    values: HashMap<String, String>,
}

impl CmsConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set only when the key has no value yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply overrides from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_env_from(prefix, std::env::vars());
    }

    pub fn load_env_from<I, K, V>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.as_ref().strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.values.insert(normalized, value.into());
            }
        }
    }

    pub fn snapshot(&self) -> CmsConfigSnapshot {
        CmsConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only view handed to components after start-up.
#[derive(Debug, Clone, Default)]
pub struct CmsConfigSnapshot {
    map: HashMap<String, String>,
}

impl CmsConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }

    /// Comma separated list, blank entries skipped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
