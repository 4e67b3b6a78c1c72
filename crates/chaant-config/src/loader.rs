//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_RE.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.chaant`).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// The `~/.chaant` home directory.
    pub fn chaant_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".chaant"))
            .unwrap_or_else(|| PathBuf::from(".chaant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.agent.turn_timeout_secs, 240);
    }

    #[test]
    fn test_load_sections() {
        let content = r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [agent]
            turn_timeout_secs = 600
            reload_retries = 2

            [collective]
            min_window_ms = 1000
            max_window_ms = 2000
            max_votes = 4

            [browser]
            headless = true
            debug_port = 9333
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.agent.turn_timeout_secs, 600);
        assert_eq!(config.agent.reload_retries, 2);
        assert_eq!(config.agent.settle_interval_ms, 5000);
        assert_eq!(config.collective.max_votes, 4);
        assert!(config.browser.headless);
        assert_eq!(config.browser.debug_port, 9333);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "port = 5000").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/chaant.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/chaant.toml")).unwrap();
        assert_eq!(config.collective.max_votes, 10);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable name
        unsafe {
            std::env::set_var("CHAANT_TEST_CONFIG_PORT", "7001");
        }
        let config = ConfigLoader::load_str("[server]\nport = ${CHAANT_TEST_CONFIG_PORT}").unwrap();
        assert_eq!(config.server.port, 7001);
        unsafe {
            std::env::remove_var("CHAANT_TEST_CONFIG_PORT");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_CHAANT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("test"));

        assert_eq!(
            ConfigLoader::expand_path("/usr/local/bin"),
            PathBuf::from("/usr/local/bin")
        );
    }
}
