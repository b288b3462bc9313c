pub mod models;
pub mod document_processor;
pub mod embedding_service;
pub mod gemini_service;
pub mod payout;
pub mod query_parser;
pub mod query_service;
pub mod reasoner;

pub use models::*;
pub use document_processor::{DocumentProcessor, UnsupportedFileType};
pub use embedding_service::EmbeddingIndex;
pub use gemini_service::{GeminiConfig, GeminiService, LanguageModel};
pub use query_parser::parse_query;
pub use query_service::ClaimEngine;
pub use reasoner::Reasoner;
