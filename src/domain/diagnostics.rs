//! Classification of generation failures into operator-actionable hints

use std::fmt;

use serde::Serialize;

/// Likely cause of a failed generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    /// Backend answered 500: bad model config, invalid key or broken backend
    ServerError,
    /// Backend answered 404: the endpoint path is wrong
    EndpointNotFound,
    /// Backend answered 401/403: the credential was rejected
    AuthenticationFailed,
    /// The request timed out
    Timeout,
    /// Empty response body
    EmptyResponse,
    Unknown,
}

impl Diagnosis {
    pub fn hint(&self) -> &'static str {
        match self {
            Diagnosis::ServerError => {
                "Backend internal error (500). Check the model name, the credential, and the backend service."
            }
            Diagnosis::EndpointNotFound => {
                "Endpoint not found (404). Check the configured endpoint URL."
            }
            Diagnosis::AuthenticationFailed => {
                "Authentication failed. Check that the credential is correct."
            }
            Diagnosis::Timeout => "Request timed out. Check network connectivity.",
            Diagnosis::EmptyResponse => "Backend returned an empty response.",
            Diagnosis::Unknown => "Unknown error. See the logs for details.",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Classifies a failure message by the status code or condition it mentions
pub fn diagnose(message: &str) -> Diagnosis {
    let lower = message.to_lowercase();

    if lower.contains("500") {
        Diagnosis::ServerError
    } else if lower.contains("404") {
        Diagnosis::EndpointNotFound
    } else if lower.contains("401") || lower.contains("403") {
        Diagnosis::AuthenticationFailed
    } else if lower.contains("timeout") || lower.contains("timed out") {
        Diagnosis::Timeout
    } else {
        Diagnosis::Unknown
    }
}
