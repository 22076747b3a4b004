//! External service adapters for the Plume agent.
//!
//! - [`OpenAiCompatProvider`] — chat completions and embeddings against any
//!   OpenAI-compatible endpoint (OpenAI, OpenRouter, vLLM, Ollama, ...)
//! - [`OpenAiImageBackend`] — image generation via `/images/generations`
//! - [`StaticProfileStore`] — config-backed owner persona lookup

pub mod openai_compat;
pub mod openai_images;
pub mod profile;

pub use openai_compat::OpenAiCompatProvider;
pub use openai_images::OpenAiImageBackend;
pub use profile::StaticProfileStore;
