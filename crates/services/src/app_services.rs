use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog::CatalogService;
use crate::error::AppServicesError;
use crate::report_service::ReportService;
use crate::sessions::QuizResultService;

/// Assembles the reporting and catalog services the CLI needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    results: Arc<QuizResultService>,
    reports: Arc<ReportService>,
    catalog: Arc<CatalogService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            results: Arc::new(QuizResultService::new(clock, Arc::clone(&storage.results))),
            reports: Arc::new(ReportService::new(Arc::clone(&storage.study_logs))),
            catalog: Arc::new(CatalogService::new(Arc::clone(&storage.questions))),
        }
    }

    #[must_use]
    pub fn results(&self) -> Arc<QuizResultService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }
}
