use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Detection error: {source_name} - {message}")]
    Detection {
        source_name: String,
        message: String,
    },

    #[error("Request error: {entry_point} - {message}")]
    Request {
        entry_point: String,
        message: String,
    },

    #[error("Scope switch error: {message}")]
    Switch { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn detection(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Detection {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn request(entry_point: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            entry_point: entry_point.into(),
            message: message.into(),
        }
    }

    pub fn switch(message: impl Into<String>) -> Self {
        Self::Switch {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
