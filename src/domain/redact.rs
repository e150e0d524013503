//! Redaction helpers for anything that reaches logs or operator notifications

use std::fmt;

use crate::domain::scope_config::ScopeConfig;

/// Endpoints longer than this are truncated in logs
pub const MAX_ENDPOINT_DISPLAY_LEN: usize = 50;

/// Masks a secret to its first and last four characters.
///
/// Secrets of eight characters or fewer are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();

    if chars.is_empty() {
        return "<none>".to_string();
    }

    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Truncates long endpoints to 47 characters plus an ellipsis
pub fn truncate_endpoint(endpoint: &str) -> String {
    if endpoint.chars().count() <= MAX_ENDPOINT_DISPLAY_LEN {
        return endpoint.to_string();
    }

    let head: String = endpoint.chars().take(MAX_ENDPOINT_DISPLAY_LEN - 3).collect();
    format!("{}...", head)
}

/// Log-safe view of a [`ScopeConfig`]
pub struct RedactedConfig<'a>(pub &'a ScopeConfig);

impl fmt::Display for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model={} endpoint={} key={} temperature={} max_tokens={}",
            self.0.model,
            truncate_endpoint(&self.0.endpoint),
            mask_secret(&self.0.credential),
            self.0.temperature,
            self.0.max_tokens
        )
    }
}

/// Summary for an optional config, as used in request failure logs
pub fn summarize(config: Option<&ScopeConfig>) -> String {
    match config {
        Some(config) => RedactedConfig(config).to_string(),
        None => "host default backend".to_string(),
    }
}
