use dashmap::DashMap;
use std::env;
use std::sync::{Arc, OnceLock};

/// Configuration service
///
/// A shared key/value store seeded from the process environment.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Create a service holding every environment variable.
    pub fn new() -> Self {
        Self::from_pairs(env::vars())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.config.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Read a flag: `1`, `true`, `yes` and `on` are true, `0`, `false`,
    /// `no` and `off` are false (case-insensitive). Anything else is `None`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// Settings for JSON rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonConfig {
    /// Indent JSON responses with two spaces.
    pub pretty_print: bool,
}

impl JsonConfig {
    pub const PRETTY_PRINT_KEY: &'static str = "JSONTOOLS_PRETTYPRINT";

    pub fn from_service(service: &ConfigService) -> Self {
        Self {
            pretty_print: service.get_bool(Self::PRETTY_PRINT_KEY).unwrap_or(false),
        }
    }

    pub fn from_env() -> Self {
        Self::from_service(&ConfigService::new())
    }
}

static JSON_CONFIG: OnceLock<JsonConfig> = OnceLock::new();

/// Install the process-wide JSON settings.
///
/// Returns `false` if settings were already installed (or already read).
pub fn install(config: JsonConfig) -> bool {
    let installed = JSON_CONFIG.set(config).is_ok();
    if !installed {
        tracing::warn!("JSON config already installed; keeping the existing one");
    }
    installed
}

/// The process-wide JSON settings; the defaults if none were installed.
pub fn json_config() -> JsonConfig {
    *JSON_CONFIG.get_or_init(JsonConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let service = ConfigService::from_pairs([("A", "1")]);
        assert_eq!(service.get("A").as_deref(), Some("1"));
        service.set("B", "two");
        assert_eq!(service.get("B").as_deref(), Some("two"));
        assert_eq!(service.get("C"), None);
    }

    #[test]
    fn test_get_bool() {
        let service = ConfigService::from_pairs([("ON", "Yes"), ("OFF", "0"), ("ODD", "maybe")]);
        assert_eq!(service.get_bool("ON"), Some(true));
        assert_eq!(service.get_bool("OFF"), Some(false));
        assert_eq!(service.get_bool("ODD"), None);
        assert_eq!(service.get_bool("MISSING"), None);
    }

    #[test]
    fn test_json_config_from_service() {
        let service = ConfigService::from_pairs([(JsonConfig::PRETTY_PRINT_KEY, "true")]);
        assert!(JsonConfig::from_service(&service).pretty_print);
        assert!(!JsonConfig::from_service(&ConfigService::default()).pretty_print);
    }
}
