#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod export;
pub mod report_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use catalog::{CatalogService, parse_catalog};
pub use error::{AppServicesError, CatalogError, ExportError, ReportError, SessionError};
pub use export::{unit_summaries_csv, write_unit_summaries_csv};
pub use report_service::ReportService;

pub use sessions::{
    AdvanceOutcome, QuizLoopService, QuizResultListItem, QuizResultService, QuizStep,
    SessionPlan, SessionPlanBuilder, SessionProgress, SessionService,
};
