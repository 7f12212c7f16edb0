//! Core domain logic for NutriLog.
//! This crate is the single source of truth for catalog, diary and profile
//! invariants.

pub mod catalog;
pub mod config;
pub mod diary;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use catalog::{CatalogError, CatalogResult, FoodCatalog, FoodRef, LoadReport, LoadWarning};
pub use config::{ConfigError, TrackerConfig};
pub use diary::{
    AddEntry, DeleteEntry, DiaryCommand, DiaryError, DiaryResult, DiaryStore, UndoHistory,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::date::{DateKey, DateKeyError};
pub use model::entry::{LogEntry, SERVINGS_TOLERANCE};
pub use model::food::{ComponentRecord, FoodId, FoodKind, FoodRecord, FoodValidationError};
pub use model::profile::{
    ActivityLevel, CalculationMethod, CalorieSummary, DailyProfile, Gender, ProfileError,
    UserProfile,
};
pub use service::nutrition_service::{NutritionService, ServiceError, ServiceResult};
pub use store::{DocumentKind, DocumentStore, FileDocumentStore, MemoryDocumentStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
