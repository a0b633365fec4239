//! Runtime configuration from environment variables

use crate::catalog::default_candidates;
use crate::error::CompassError;
use crate::gemini::DEFAULT_MODEL;
use crate::Result;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Absent → rule-based collaborators
    pub gemini_api_key: Option<String>,
    pub extraction_model: String,
    pub generation_model: String,
    /// Tried before the default catalog locations
    pub data_path: Option<PathBuf>,
    pub port: u16,
}

impl AppConfig {
    /// Read the process environment (after `.env` has been loaded)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| CompassError::ConfigError(format!("Invalid port '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            extraction_model: get("GEMINI_EXTRACTION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation_model: get("GEMINI_GENERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            data_path: get("WELFARE_DATA_PATH").map(PathBuf::from),
            port,
        })
    }

    pub fn catalog_candidates(&self) -> Vec<PathBuf> {
        default_candidates(self.data_path.as_deref())
    }

    pub fn uses_llm(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            extraction_model: DEFAULT_MODEL.to_string(),
            generation_model: DEFAULT_MODEL.to_string(),
            data_path: None,
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.uses_llm());
        assert_eq!(config.catalog_candidates()[0], PathBuf::from("welfare_data.csv"));
    }

    #[test]
    fn test_explicit_values() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_GENERATION_MODEL", "gemini-1.5-pro"),
            ("WELFARE_DATA_PATH", "/srv/welfare.csv"),
            ("API_PORT", "3000"),
        ])
        .unwrap();

        assert!(config.uses_llm());
        assert_eq!(config.generation_model, "gemini-1.5-pro");
        assert_eq!(config.extraction_model, DEFAULT_MODEL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.catalog_candidates()[0], PathBuf::from("/srv/welfare.csv"));
    }

    #[test]
    fn test_port_takes_priority_and_blank_key_is_unset() {
        let config = config_from(&[("PORT", "9000"), ("API_PORT", "3000"), ("GEMINI_API_KEY", "  ")])
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.gemini_api_key, None);
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, CompassError::ConfigError(_)));
    }
}
