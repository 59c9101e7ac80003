//! AI Layer
//!
//! Generation provider abstraction, prompt construction, response
//! validation, and chat-history sanitization.
//!
//! ## Modules
//!
//! - [`provider`]: the `GenerationProvider` trait and the Gemini implementation
//! - [`prompt`]: plan / content / chat prompt builders
//! - [`validation`]: JSON extraction and plan-category repair
//! - [`sanitize`]: must-start-with-user history normalization

pub mod prompt;
pub mod provider;
pub mod sanitize;
pub mod validation;

pub use provider::{
    ChatRequest, ChunkStream, ContentRequest, GeminiProvider, GenerationProvider, PlanRequest,
    PlannedSection, ProviderConfig, SharedProvider, create_provider,
};
pub use sanitize::{sanitize_history, starts_with_user};
