//! Scope config validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ScopeConfig;

/// Matches endpoints whose host is a loopback address (a local backend
/// holding its own credentials)
static LOOPBACK_ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(localhost|127\.0\.0\.1|\[::1\])(:\d+)?(/.*)?$").unwrap()
});

/// Scope config validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeConfigValidationError {
    /// Endpoint is empty
    EmptyEndpoint,
    /// Endpoint does not start with http:// or https://
    InvalidEndpointScheme,
    /// Credential is empty for a non-loopback endpoint
    MissingCredential,
    /// Model name is empty
    EmptyModel,
    /// Temperature out of valid range
    InvalidTemperature { value: f32, min: f32, max: f32 },
    /// Max tokens is zero
    InvalidMaxTokens,
    /// Stored record could not be read as a scope config
    Malformed { reason: String },
}

impl fmt::Display for ScopeConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEndpoint => write!(f, "Endpoint cannot be empty"),
            Self::InvalidEndpointScheme => {
                write!(f, "Endpoint must start with http:// or https://")
            }
            Self::MissingCredential => write!(
                f,
                "Credential cannot be empty (may be omitted only for a local backend)"
            ),
            Self::EmptyModel => write!(f, "Model name cannot be empty"),
            Self::InvalidTemperature { value, min, max } => {
                write!(
                    f,
                    "Invalid temperature {}: must be between {} and {}",
                    value, min, max
                )
            }
            Self::InvalidMaxTokens => write!(f, "max_tokens must be greater than 0"),
            Self::Malformed { reason } => write!(f, "Stored record is malformed: {}", reason),
        }
    }
}

impl std::error::Error for ScopeConfigValidationError {}

/// True when the endpoint points at a loopback host
pub fn is_loopback_endpoint(endpoint: &str) -> bool {
    LOOPBACK_ENDPOINT_PATTERN.is_match(endpoint.trim())
}

/// Validate an endpoint URL
pub fn validate_endpoint(endpoint: &str) -> Result<(), ScopeConfigValidationError> {
    let endpoint = endpoint.trim();

    if endpoint.is_empty() {
        return Err(ScopeConfigValidationError::EmptyEndpoint);
    }

    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ScopeConfigValidationError::InvalidEndpointScheme);
    }

    Ok(())
}

/// Validate the credential against its endpoint
pub fn validate_credential(
    endpoint: &str,
    credential: &str,
) -> Result<(), ScopeConfigValidationError> {
    if credential.trim().is_empty() && !is_loopback_endpoint(endpoint) {
        return Err(ScopeConfigValidationError::MissingCredential);
    }

    Ok(())
}

/// Validate temperature value
pub fn validate_temperature(temp: f32) -> Result<(), ScopeConfigValidationError> {
    const MIN: f32 = 0.0;
    const MAX: f32 = 2.0;

    if !(MIN..=MAX).contains(&temp) {
        return Err(ScopeConfigValidationError::InvalidTemperature {
            value: temp,
            min: MIN,
            max: MAX,
        });
    }

    Ok(())
}

/// Validate max_tokens value
pub fn validate_max_tokens(max_tokens: u32) -> Result<(), ScopeConfigValidationError> {
    if max_tokens == 0 {
        return Err(ScopeConfigValidationError::InvalidMaxTokens);
    }

    Ok(())
}

/// Validate a complete ScopeConfig, collecting every violated rule
pub fn validate_scope_config(config: &ScopeConfig) -> Result<(), Vec<ScopeConfigValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_endpoint(&config.endpoint) {
        errors.push(e);
    }

    if let Err(e) = validate_credential(&config.endpoint, &config.credential) {
        errors.push(e);
    }

    if config.model.trim().is_empty() {
        errors.push(ScopeConfigValidationError::EmptyModel);
    }

    if let Err(e) = validate_temperature(config.temperature) {
        errors.push(e);
    }

    if let Err(e) = validate_max_tokens(config.max_tokens) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Joins validation errors into one operator-facing line
pub fn describe_errors(errors: &[ScopeConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScopeConfig {
        ScopeConfig::new("https://api.example.com/v1", "sk-test-1234567890", "gpt-4o")
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_scope_config(&config()).is_ok());
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback_endpoint("http://localhost:8000/v1"));
        assert!(is_loopback_endpoint("http://127.0.0.1"));
        assert!(is_loopback_endpoint("https://[::1]:9000/"));
        assert!(!is_loopback_endpoint("https://localhost.example.com/v1"));
        assert!(!is_loopback_endpoint("https://api.example.com/localhost"));
    }

    #[test]
    fn test_credential_optional_for_local_backend() {
        let mut local = config();
        local.endpoint = "http://localhost:5001/v1".to_string();
        local.credential = String::new();
        assert!(validate_scope_config(&local).is_ok());

        let mut remote = config();
        remote.credential = "  ".to_string();
        assert_eq!(
            validate_scope_config(&remote),
            Err(vec![ScopeConfigValidationError::MissingCredential])
        );
    }

    #[test]
    fn test_endpoint_rules() {
        assert_eq!(
            validate_endpoint(""),
            Err(ScopeConfigValidationError::EmptyEndpoint)
        );
        assert_eq!(
            validate_endpoint("ftp://api.example.com"),
            Err(ScopeConfigValidationError::InvalidEndpointScheme)
        );
        assert!(validate_endpoint("http://api.example.com").is_ok());
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(validate_temperature(0.0).is_ok());
        assert!(validate_temperature(2.0).is_ok());
        assert!(validate_temperature(2.1).is_err());
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(f32::NAN).is_err());
        assert!(validate_max_tokens(1).is_ok());
        assert_eq!(
            validate_max_tokens(0),
            Err(ScopeConfigValidationError::InvalidMaxTokens)
        );
    }

    #[test]
    fn test_collects_every_error() {
        let broken = ScopeConfig {
            endpoint: String::new(),
            credential: String::new(),
            model: String::new(),
            temperature: 3.0,
            max_tokens: 0,
        };

        let errors = validate_scope_config(&broken).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(describe_errors(&errors).contains("Model name cannot be empty"));
    }
}
