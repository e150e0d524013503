use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Message;
use crate::domain::redact::mask_secret;
use crate::domain::scope_config::ScopeConfig;

/// Wire format tag for overrides; backends speak the OpenAI-compatible dialect
pub const DEFAULT_API_SOURCE: &str = "openai";

/// Explicit per-call backend override carried by a request.
///
/// When present on an incoming request, the caller's intent wins and the
/// request is forwarded untouched.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomApi {
    pub apiurl: String,
    #[serde(default)]
    pub key: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub source: String,
}

impl From<&ScopeConfig> for CustomApi {
    fn from(config: &ScopeConfig) -> Self {
        Self {
            apiurl: config.endpoint.clone(),
            key: config.credential.clone(),
            model: config.model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            source: DEFAULT_API_SOURCE.to_string(),
        }
    }
}

impl fmt::Debug for CustomApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomApi")
            .field("apiurl", &self.apiurl)
            .field("key", &mask_secret(&self.key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("source", &self.source)
            .finish()
    }
}

/// Requests that may carry an explicit backend override
pub trait OverridableRequest: Clone + Send + Sync + fmt::Debug + 'static {
    /// Name of the host entry point this request is issued through
    const ENTRY_POINT: &'static str;

    fn custom_api(&self) -> Option<&CustomApi>;

    /// Returns a new request with every field kept and the override applied
    fn with_custom_api(self, custom_api: CustomApi) -> Self;

    fn has_explicit_override(&self) -> bool {
        self.custom_api().is_some()
    }
}

/// Request for the host's chat-driven generation entry point
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub should_stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chat_history: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_api: Option<CustomApi>,
    /// Host-owned fields this layer carries along without interpreting
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Self::default()
        }
    }

    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }
}

impl OverridableRequest for GenerationRequest {
    const ENTRY_POINT: &'static str = "issue_request";

    fn custom_api(&self) -> Option<&CustomApi> {
        self.custom_api.as_ref()
    }

    fn with_custom_api(self, custom_api: CustomApi) -> Self {
        Self {
            custom_api: Some(custom_api),
            ..self
        }
    }
}

/// Builder for GenerationRequest
#[derive(Debug, Default)]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    pub fn user_input(mut self, input: impl Into<String>) -> Self {
        self.request.user_input = input.into();
        self
    }

    pub fn should_stream(mut self, stream: bool) -> Self {
        self.request.should_stream = stream;
        self
    }

    pub fn max_chat_history(mut self, messages: u32) -> Self {
        self.request.max_chat_history = Some(messages);
        self
    }

    pub fn custom_api(mut self, custom_api: CustomApi) -> Self {
        self.request.custom_api = Some(custom_api);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.request.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> GenerationRequest {
        self.request
    }
}

/// Request for the host's raw generation entry point (caller-ordered prompts)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawGenerationRequest {
    #[serde(default)]
    pub ordered_prompts: Vec<Message>,
    #[serde(default)]
    pub should_stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_api: Option<CustomApi>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawGenerationRequest {
    pub fn new(ordered_prompts: Vec<Message>) -> Self {
        Self {
            ordered_prompts,
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, message: Message) -> Self {
        self.ordered_prompts.push(message);
        self
    }

    pub fn with_explicit_api(mut self, custom_api: CustomApi) -> Self {
        self.custom_api = Some(custom_api);
        self
    }
}

impl OverridableRequest for RawGenerationRequest {
    const ENTRY_POINT: &'static str = "issue_raw_request";

    fn custom_api(&self) -> Option<&CustomApi> {
        self.custom_api.as_ref()
    }

    fn with_custom_api(self, custom_api: CustomApi) -> Self {
        Self {
            custom_api: Some(custom_api),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_api_from_scope_config() {
        let config = ScopeConfig::new("https://api.example.com", "sk-123456789", "gpt-4o")
            .with_temperature(0.3)
            .with_max_tokens(512);

        let api = CustomApi::from(&config);
        assert_eq!(api.apiurl, "https://api.example.com");
        assert_eq!(api.temperature, Some(0.3));
        assert_eq!(api.max_tokens, Some(512));
        assert_eq!(api.source, DEFAULT_API_SOURCE);
    }

    #[test]
    fn test_with_custom_api_keeps_every_field() {
        let original = GenerationRequest::builder()
            .user_input("describe the alley")
            .should_stream(true)
            .max_chat_history(12)
            .extra("image", serde_json::json!("data:..."))
            .build();

        let config = ScopeConfig::new("https://api.example.com", "sk-123456789", "gpt-4o");
        let modified = original.clone().with_custom_api(CustomApi::from(&config));

        assert_eq!(modified.user_input, original.user_input);
        assert_eq!(modified.should_stream, original.should_stream);
        assert_eq!(modified.max_chat_history, original.max_chat_history);
        assert_eq!(modified.extra, original.extra);
        assert!(modified.has_explicit_override());
        assert!(!original.has_explicit_override());
    }

    #[test]
    fn test_raw_request_keeps_ordered_prompts() {
        let original = RawGenerationRequest::new(vec![Message::system("rules"), Message::user("hi")]);
        let config = ScopeConfig::new("https://api.example.com", "sk-123456789", "gpt-4o");
        let modified = original.clone().with_custom_api(CustomApi::from(&config));

        assert_eq!(modified.ordered_prompts, original.ordered_prompts);
        assert_eq!(modified.custom_api.unwrap().model, "gpt-4o");
    }

    #[test]
    fn test_unknown_fields_survive_deserialization() {
        let json = serde_json::json!({
            "user_input": "hi",
            "overrides": {"world_info_before": "x"}
        });

        let request: GenerationRequest = serde_json::from_value(json).unwrap();
        assert!(request.extra.contains_key("overrides"));
    }
}
