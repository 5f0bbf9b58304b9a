use crate::pipeline::followup::StreamGuardConfig;

/// Application-level constants
pub const APP_NAME: &str = "carecards";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Ollama-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "medgemma:4b";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carecards=info,warn"
}

/// Connection settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for structured calls. Streaming calls only use the connect timeout.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
        }
    }
}

impl BackendConfig {
    /// Read overrides from `CARECARDS_OLLAMA_URL`, `CARECARDS_MODEL` and
    /// `CARECARDS_REQUEST_TIMEOUT_SECS`. Unset or unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("CARECARDS_OLLAMA_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("CARECARDS_MODEL").filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(secs) = lookup("CARECARDS_REQUEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            config.request_timeout_secs = secs;
        }
        config
    }
}

/// Tunables for one conversation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User messages shorter than this (in characters) count as "your own questions".
    pub short_question_max_chars: usize,
    /// Upper bound on key terms taken from the document for the grounding check.
    pub max_key_terms: usize,
    pub guard: StreamGuardConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            short_question_max_chars: 500,
            max_key_terms: 20,
            guard: StreamGuardConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_ollama() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = BackendConfig::from_lookup(lookup_from(&[
            ("CARECARDS_OLLAMA_URL", "http://gpu-box:11434/"),
            ("CARECARDS_MODEL", "llama3.1:8b"),
            ("CARECARDS_REQUEST_TIMEOUT_SECS", "60"),
        ]));
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3.1:8b");
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn blank_or_invalid_values_keep_defaults() {
        let config = BackendConfig::from_lookup(lookup_from(&[
            ("CARECARDS_MODEL", "   "),
            ("CARECARDS_REQUEST_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config, BackendConfig::default());
    }

    #[test]
    fn session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.short_question_max_chars, 500);
        assert_eq!(config.max_key_terms, 20);
    }

    #[test]
    fn app_name_is_carecards() {
        assert_eq!(APP_NAME, "carecards");
    }
}
