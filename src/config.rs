use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_TURNS: usize = 10;

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const BASE_URL_VAR: &str = "PDF_ASSISTANT_BASE_URL";
const MODEL_VAR: &str = "PDF_ASSISTANT_MODEL";
const MAX_TURNS_VAR: &str = "PDF_ASSISTANT_MAX_TURNS";
const PROFILE_PATH_VAR: &str = "PDF_ASSISTANT_PROFILE_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_turns: usize,
    pub profile_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!("ignoring unreadable .env: {err}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(API_KEY_VAR))?;

        let base_url = lookup(BASE_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_turns = match lookup(MAX_TURNS_VAR) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(turns) if turns > 0 => turns,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        key: MAX_TURNS_VAR,
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_TURNS,
        };

        let profile_path = lookup(PROFILE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_profile_path);

        Ok(Self {
            api_key,
            base_url,
            model,
            max_turns,
            profile_path,
        })
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_profile_path() -> PathBuf {
    home_dir().join(".pdf-assistant").join("profile.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = Config::from_lookup(lookup_from(&[])).expect_err("key is required");
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")]))
            .expect("config should load");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert!(config.profile_path.ends_with(".pdf-assistant/profile.json"));
    }

    #[test]
    fn overrides_are_honoured_and_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("PDF_ASSISTANT_BASE_URL", "http://localhost:8080/v1/"),
            ("PDF_ASSISTANT_MODEL", "local-model"),
            ("PDF_ASSISTANT_MAX_TURNS", "3"),
            ("PDF_ASSISTANT_PROFILE_PATH", "/tmp/profile.json"),
        ]))
        .expect("config should load");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.max_turns, 3);
        assert_eq!(config.profile_path, PathBuf::from("/tmp/profile.json"));
    }

    #[test]
    fn zero_max_turns_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("PDF_ASSISTANT_MAX_TURNS", "0"),
        ]))
        .expect_err("zero turns is invalid");
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
