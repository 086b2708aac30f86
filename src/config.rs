use serde::Deserialize;
use std::path::PathBuf;

use crate::github::DEFAULT_API_URL;

/// GitHub caps `per_page` at 100
pub const MAX_PER_PAGE: u8 = 100;
pub const DEFAULT_PER_PAGE: u8 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token_env: Some("GITHUB_TOKEN".to_string()),
            token_command: Some("gh auth token".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Kept wide so out-of-range values clamp instead of failing the parse
    pub per_page: i64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            per_page: i64::from(DEFAULT_PER_PAGE),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("issuescope").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
                Config::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply command-line overrides on top of the file values
    pub fn with_overrides(mut self, api_url: Option<String>, per_page: Option<i64>) -> Self {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        if let Some(n) = per_page {
            self.view.per_page = n;
        }
        self
    }

    /// Page size clamped to what the service accepts
    pub fn per_page(&self) -> u8 {
        let clamped = self.view.per_page.clamp(1, i64::from(MAX_PER_PAGE));
        u8::try_from(clamped).unwrap_or(MAX_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[api]
base_url = "https://ghe.company.com/api/v3"
token_env = "GHE_TOKEN"

[view]
per_page = 20
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://ghe.company.com/api/v3");
        assert_eq!(config.api.token_env.as_deref(), Some("GHE_TOKEN"));
        // Unset keys inside a present table keep their defaults
        assert_eq!(config.api.token_command.as_deref(), Some("gh auth token"));
        assert_eq!(config.per_page(), 20);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(Config::parse("[view]\nper_page = \"five\"").is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = Config::default().with_overrides(Some("http://localhost:8080".into()), Some(10));
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.per_page(), 10);
    }

    #[test]
    fn out_of_range_file_values_clamp_without_losing_other_keys() {
        let high = Config::parse(
            "[api]\nbase_url = \"https://ghe.example/api/v3\"\n[view]\nper_page = 300\n",
        )
        .unwrap();
        assert_eq!(high.api.base_url, "https://ghe.example/api/v3");
        assert_eq!(high.per_page(), MAX_PER_PAGE);

        let negative = Config::parse("[view]\nper_page = -1\n").unwrap();
        assert_eq!(negative.per_page(), 1);
    }

    #[test]
    fn per_page_is_clamped() {
        let zero = Config::default().with_overrides(None, Some(0));
        assert_eq!(zero.per_page(), 1);
        let huge = Config::default().with_overrides(None, Some(250));
        assert_eq!(huge.per_page(), MAX_PER_PAGE);
    }
}
