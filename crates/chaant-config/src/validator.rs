//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }

    /// Like [`into_result`](Self::into_result), with the first warning
    /// rejected as well.
    pub fn into_strict_result(self) -> Result<(), ConfigError> {
        let warnings = self.into_result()?;
        match warnings.into_iter().next() {
            Some(warning) => Err(ConfigError::StrictWarning {
                field: warning.path,
                message: warning.message,
            }),
            None => Ok(()),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_agent(config, &mut result);
        Self::validate_collective(config, &mut result);
        Self::validate_catalog(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.port == config.browser.debug_port {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "debug_port collides with server.port",
            ));
        }
    }

    fn validate_agent(config: &Config, result: &mut ValidationResult) {
        let agent = &config.agent;

        if agent.turn_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.turn_timeout_secs",
                "turn_timeout_secs must be greater than 0",
            ));
        }

        if agent.settle_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "agent.settle_interval_ms",
                "settle_interval_ms must be greater than 0",
            ));
        }

        if agent.confirm_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "agent.confirm_timeout_ms",
                "confirm_timeout_ms must be greater than 0",
            ));
        }

        if agent.settle_interval() > agent.turn_timeout() {
            result.add_warning(ValidationWarning::new(
                "agent.settle_interval_ms",
                "settle interval exceeds the turn timeout, page state will never be re-read",
            ));
        }

        if agent.reload_retries > 3 {
            result.add_warning(ValidationWarning::new(
                "agent.reload_retries",
                "more than 3 reloads per move may forfeit games on time",
            ));
        }
    }

    fn validate_collective(config: &Config, result: &mut ValidationResult) {
        let collective = &config.collective;

        if collective.min_window_ms > collective.max_window_ms {
            result.add_error(ValidationError::new(
                "collective.min_window_ms",
                "min_window_ms must not exceed max_window_ms",
            ));
        }

        if collective.max_votes == 0 {
            result.add_error(ValidationError::new(
                "collective.max_votes",
                "max_votes must be greater than 0",
            ));
        }

        if collective.max_window_ms / 1000 >= config.agent.turn_timeout_secs {
            result.add_warning(ValidationWarning::new(
                "collective.max_window_ms",
                "commit window is not shorter than the turn timeout",
            ));
        }
    }

    fn validate_catalog(config: &Config, result: &mut ValidationResult) {
        let url = &config.catalog.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "catalog.url",
                "url must start with http:// or https://",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
