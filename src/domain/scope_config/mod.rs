//! Per-scope backend configuration and its validation rules

mod entity;
mod source;
mod validation;

pub use entity::{MultiScopeConfig, ScopeConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use source::ScopeConfigSource;
pub use validation::{
    describe_errors, is_loopback_endpoint, validate_credential, validate_endpoint,
    validate_max_tokens, validate_scope_config, validate_temperature, ScopeConfigValidationError,
};

#[cfg(test)]
pub use source::MockScopeConfigSource;
