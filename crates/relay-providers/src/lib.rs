//! Provider adapters for external generation services.

/// Groq provider implementation.
pub mod groq;
/// Hugging Face text inference provider implementation.
pub mod huggingface;
/// Hugging Face image generation pipeline.
pub mod image;
/// Scripted providers for exercising the dispatcher without network access.
pub mod mock;

pub use groq::GroqProvider;
pub use huggingface::HuggingFaceProvider;
pub use image::HuggingFaceImageGenerator;
pub use mock::{MockCall, MockFailure, MockImageGenerator, MockProvider};
