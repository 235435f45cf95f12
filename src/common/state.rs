// Application state shared across all modules

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::dev_mode::DevModeConfig;
use crate::services::{
    CoverLetterGenerator, EmbeddingProvider, JobScraper, MessageGenerator, OpenAIService,
    PdfService, RateLimitConfig, RateLimitService, ResumeContentGenerator, ResumeTailor,
    SettingsService, TavilyClient, VectorStore,
};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub jwt_secret: String,
    pub dev_mode: DevModeConfig,
    pub settings_service: Arc<SettingsService>,
    pub openai_service: Arc<OpenAIService>,
    pub vector_store: Arc<VectorStore>,
    pub tavily: Arc<TavilyClient>,
    pub job_scraper: Arc<JobScraper>,
    pub cover_letters: Arc<CoverLetterGenerator>,
    pub message_generator: Arc<MessageGenerator>,
    pub resume_content: Arc<ResumeContentGenerator>,
    pub resume_tailor: Arc<ResumeTailor>,
    pub pdf_service: Arc<PdfService>,
    pub rate_limit_service: Arc<RateLimitService>,
}

impl AppState {
    /// Wires every service on top of the pool and settings. Directory,
    /// upload limit, dev mode, PDF backend and rate limits start at their
    /// defaults and are overridden by the caller.
    pub fn new(
        db: SqlitePool,
        jwt_secret: String,
        settings_service: Arc<SettingsService>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let openai_service = Arc::new(OpenAIService::new(settings_service.clone()));
        let tavily = Arc::new(TavilyClient::new(settings_service.clone()));

        Self {
            vector_store: Arc::new(VectorStore::new(db.clone(), embeddings)),
            job_scraper: Arc::new(JobScraper::new(tavily.clone())),
            cover_letters: Arc::new(CoverLetterGenerator::new(openai_service.clone())),
            message_generator: Arc::new(MessageGenerator::new(openai_service.clone())),
            resume_content: Arc::new(ResumeContentGenerator::new(openai_service.clone())),
            resume_tailor: Arc::new(ResumeTailor::new(openai_service.clone())),
            pdf_service: Arc::new(PdfService::default()),
            rate_limit_service: Arc::new(RateLimitService::new(RateLimitConfig::default())),
            uploads_dir: PathBuf::from("./uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            dev_mode: DevModeConfig::default(),
            db,
            jwt_secret,
            settings_service,
            openai_service,
            tavily,
        }
    }
}
