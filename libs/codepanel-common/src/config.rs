// Application configuration, read from the environment

use std::env;

pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston/execute";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Absent means in-memory stores
    pub redis_url: Option<String>,
    pub piston_url: String,
    pub execution_timeout_ms: u64,
    pub max_parallel_examples: usize,
    pub languages_path: String,
    pub problems_path: Option<String>,
    /// Sessions untouched this long lose their in-memory editor state
    pub session_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            redis_url: None,
            piston_url: DEFAULT_PISTON_URL.to_string(),
            execution_timeout_ms: 10_000,
            max_parallel_examples: 4,
            languages_path: "config/languages.json".to_string(),
            problems_path: None,
            session_idle_secs: 4 * 60 * 60,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            redis_url: non_empty("REDIS_URL"),
            piston_url: non_empty("PISTON_URL").unwrap_or(defaults.piston_url),
            execution_timeout_ms: non_empty("EXECUTION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.execution_timeout_ms),
            max_parallel_examples: non_empty("MAX_PARALLEL_EXAMPLES")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_parallel_examples),
            languages_path: non_empty("LANGUAGES_CONFIG").unwrap_or(defaults.languages_path),
            problems_path: non_empty("PROBLEMS_CONFIG"),
            session_idle_secs: non_empty("SESSION_IDLE_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.session_idle_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.piston_url, DEFAULT_PISTON_URL);
        assert_eq!(config.execution_timeout_ms, 10_000);
        assert!(config.redis_url.is_none());
        assert_eq!(config.session_idle_secs, 14_400);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REDIS_URL", "redis://cache:6379"),
            ("EXECUTION_TIMEOUT_MS", "2500"),
            ("MAX_PARALLEL_EXAMPLES", "zero"),
            ("PROBLEMS_CONFIG", "  "),
            ("SESSION_IDLE_SECS", "900"),
        ]);

        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.execution_timeout_ms, 2500);
        assert_eq!(config.max_parallel_examples, 4);
        assert!(config.problems_path.is_none());
        assert_eq!(config.session_idle_secs, 900);
    }
}
