use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::format::FormatOptions;
use crate::store::EvictionPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek-reasoner";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Html,
    Text,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub format: FormatOptions,
    pub highlight: bool,
    pub output: OutputMode,
    pub eviction: EvictionPolicy,
    pub store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            format: FormatOptions::default(),
            highlight: false,
            output: OutputMode::Text,
            eviction: EvictionPolicy::default(),
            store_path: None,
        }
    }
}

impl ClientConfig {
    /// Reads `DEEPCHAT_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let eviction = EvictionPolicy {
            max_age: get("DEEPCHAT_MAX_CHAT_AGE_HOURS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(|hours| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(defaults.eviction.max_age),
            max_chats: get("DEEPCHAT_MAX_CHATS")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.eviction.max_chats),
        };

        let output = match get("DEEPCHAT_OUTPUT")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("html") => OutputMode::Html,
            _ => OutputMode::Text,
        };

        Self {
            api_url: get("DEEPCHAT_API_URL").unwrap_or(defaults.api_url),
            api_key: get("DEEPCHAT_API_KEY"),
            model: get("DEEPCHAT_MODEL").unwrap_or(defaults.model),
            format: FormatOptions {
                filter_noise: get("DEEPCHAT_FILTER_NOISE").is_some_and(|v| is_truthy(&v)),
            },
            highlight: get("DEEPCHAT_HIGHLIGHT").is_some_and(|v| is_truthy(&v)),
            output,
            eviction,
            store_path: get("DEEPCHAT_STORE_PATH").map(PathBuf::from),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), ClientConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DEEPCHAT_API_URL", "http://example.test/api"),
            ("DEEPCHAT_API_KEY", " sk-1 "),
            ("DEEPCHAT_FILTER_NOISE", "Yes"),
            ("DEEPCHAT_HIGHLIGHT", "on"),
            ("DEEPCHAT_OUTPUT", "HTML"),
            ("DEEPCHAT_MAX_CHAT_AGE_HOURS", "2"),
            ("DEEPCHAT_MAX_CHATS", "5"),
        ]);
        assert_eq!(config.api_url, "http://example.test/api");
        assert_eq!(config.api_key.as_deref(), Some("sk-1"));
        assert!(config.format.filter_noise);
        assert!(config.highlight);
        assert_eq!(config.output, OutputMode::Html);
        assert_eq!(config.eviction.max_age, Duration::from_secs(7200));
        assert_eq!(config.eviction.max_chats, 5);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = config_from(&[("DEEPCHAT_MAX_CHATS", "lots"), ("DEEPCHAT_FILTER_NOISE", "nah")]);
        assert_eq!(config.eviction.max_chats, 50);
        assert!(!config.format.filter_noise);
    }
}
