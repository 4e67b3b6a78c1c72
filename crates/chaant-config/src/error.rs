//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A validator warning raised while warnings are treated as errors.
    #[error("Rejected {field} under strict validation: {message}")]
    StrictWarning { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound("chaant.toml".to_string());
        assert!(err.to_string().contains("chaant.toml"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::InvalidValue {
            field: "collective.max_votes".to_string(),
            message: "must be positive".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("collective.max_votes"));
        assert!(display.contains("must be positive"));
    }

    #[test]
    fn test_env_var_not_set_error() {
        let err = ConfigError::EnvVarNotSet("CHAANT_PORT".to_string());
        assert!(err.to_string().contains("CHAANT_PORT"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_strict_warning_error() {
        let err = ConfigError::StrictWarning {
            field: "agent.reload_retries".to_string(),
            message: "more than 3 reloads per move may forfeit games on time".to_string(),
        };
        let display = err.to_string();
        assert!(display.starts_with("Rejected agent.reload_retries under strict validation"));
        assert!(display.contains("forfeit games on time"));
    }

    #[test]
    fn test_toml_parse_error_from() {
        let parse = toml::from_str::<toml::Value>("[collective\nmax_votes = 10").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "~/.chaant");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("~/.chaant"));
    }
}
