use serde::{Deserialize, Serialize};

/// Engine configuration (from config.toml in the state directory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Web search URL; `%s` is replaced by the encoded query
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_history_max_results")]
    pub history_max_results: usize,
    /// How many raw history entries to request before URL filtering
    #[serde(default = "default_history_fetch_limit")]
    pub history_fetch_limit: usize,
    /// Only search history visited within this many days (absent = all history)
    #[serde(default)]
    pub history_lookback_days: Option<u32>,
    /// Quiet period used to coalesce bursts of change events
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Schemes grouped by scheme name in addition to the built-in list
    #[serde(default)]
    pub extra_internal_schemes: Vec<String>,
    #[serde(default = "default_session_title")]
    pub default_session_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_url: default_search_url(),
            history_max_results: default_history_max_results(),
            history_fetch_limit: default_history_fetch_limit(),
            history_lookback_days: None,
            debounce_ms: default_debounce_ms(),
            extra_internal_schemes: Vec::new(),
            default_session_title: default_session_title(),
        }
    }
}

fn default_search_url() -> String {
    "https://www.google.com/search?q=%s".to_string()
}

fn default_history_max_results() -> usize {
    8
}

fn default_history_fetch_limit() -> usize {
    100
}

fn default_debounce_ms() -> u64 {
    75
}

fn default_session_title() -> String {
    "default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_session_title, "default");
    }

    #[test]
    fn partial_config_overrides() {
        let config: EngineConfig = toml::from_str(
            r#"
search_url = "https://duckduckgo.com/html/?q=%s"
history_lookback_days = 14
extra_internal_schemes = ["vivaldi"]
"#,
        )
        .unwrap();
        assert_eq!(config.search_url, "https://duckduckgo.com/html/?q=%s");
        assert_eq!(config.history_lookback_days, Some(14));
        assert_eq!(config.extra_internal_schemes, vec!["vivaldi"]);
        assert_eq!(config.history_max_results, 8);
        assert_eq!(config.history_fetch_limit, 100);
    }
}
