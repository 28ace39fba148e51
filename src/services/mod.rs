// src/services/mod.rs
pub mod gemini_service;
pub mod history;
pub mod image_codec;
pub mod session;

pub use gemini_service::GeminiService;
pub use session::{Session, TransformOutcome};
