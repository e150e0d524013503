//! Infrastructure services

mod scope_config_service;

pub use scope_config_service::{ScopeConfigService, ScopeValidationReport};
