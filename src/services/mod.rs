// src/services/mod.rs
//
// Shared services used by the route modules: provider clients, document
// processing, generators and the vector index

pub mod cover_letters;
pub mod embeddings;
pub mod encryption;
pub mod job_scraper;
pub mod keyword_extractor;
pub mod message_generator;
pub mod openai;
pub mod pdf;
pub mod rate_limit;
pub mod recommended_skills;
pub mod resume_content;
pub mod resume_processor;
pub mod resume_tailor;
pub mod settings;
pub mod tavily;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use cover_letters::CoverLetterGenerator;
pub use embeddings::{EmbeddingProvider, OpenAIEmbeddings};
pub use job_scraper::JobScraper;
pub use message_generator::MessageGenerator;
pub use openai::OpenAIService;
pub use pdf::PdfService;
pub use rate_limit::{RateLimitConfig, RateLimitService};
pub use resume_content::ResumeContentGenerator;
pub use resume_tailor::ResumeTailor;
pub use settings::SettingsService;
pub use tavily::TavilyClient;
pub use vector_store::VectorStore;
