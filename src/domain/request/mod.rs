//! Generation request types for the two host entry points

mod message;
#[allow(clippy::module_inception)]
mod request;

pub use message::{Message, MessageRole};
pub use request::{
    CustomApi, DEFAULT_API_SOURCE, GenerationRequest, GenerationRequestBuilder,
    OverridableRequest, RawGenerationRequest,
};
