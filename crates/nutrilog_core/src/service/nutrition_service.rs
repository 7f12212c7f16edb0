//! Nutrition tracking use-case service.
//!
//! # Responsibility
//! - Own the catalog, diary, undo history and profile for one session.
//! - Route every diary mutation through `UndoHistory`.
//! - Load and save documents through an injected `DocumentStore`.
//!
//! # Invariants
//! - Documents that were never saved start empty (or default for profiles).
//! - A malformed document aborts `open`/reload and leaves in-memory state
//!   untouched.
//! - Catalog edits never rewrite diary snapshots.

use crate::catalog::{CatalogError, FoodCatalog, FoodRef, LoadReport};
use crate::diary::{DiaryCommand, DiaryError, DiaryStore, UndoHistory};
use crate::model::date::DateKey;
use crate::model::entry::LogEntry;
use crate::model::food::{FoodId, FoodRecord};
use crate::model::profile::{CalorieSummary, DailyProfile, ProfileError, UserProfile};
use crate::service::summary::calorie_summary;
use crate::store::{DocumentKind, DocumentStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Catalog(CatalogError),
    Diary(DiaryError),
    Profile(ProfileError),
    Store(StoreError),
    /// Persisted profile document is structurally invalid.
    MalformedProfile(String),
    /// Profile could not be encoded.
    ProfileSerialization(serde_json::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Diary(err) => write!(f, "{err}"),
            Self::Profile(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::MalformedProfile(message) => write!(f, "malformed user profile: {message}"),
            Self::ProfileSerialization(err) => write!(f, "failed to serialize user profile: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Diary(err) => Some(err),
            Self::Profile(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::MalformedProfile(_) => None,
            Self::ProfileSerialization(err) => Some(err),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<DiaryError> for ServiceError {
    fn from(value: DiaryError) -> Self {
        Self::Diary(value)
    }
}

impl From<ProfileError> for ServiceError {
    fn from(value: ProfileError) -> Self {
        Self::Profile(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Session facade over catalog, diary, undo history and profile.
pub struct NutritionService<S: DocumentStore> {
    store: S,
    catalog: FoodCatalog,
    load_report: LoadReport,
    diary: DiaryStore,
    history: UndoHistory,
    profile: UserProfile,
    profile_modified: bool,
}

impl<S: DocumentStore> NutritionService<S> {
    /// Loads all documents from `store`.
    ///
    /// # Errors
    /// - `Store` when a document cannot be read.
    /// - `Catalog`/`Diary` `MalformedPersistentState` or `MalformedProfile`
    ///   when a document is structurally invalid.
    pub fn open(store: S) -> ServiceResult<Self> {
        let started_at = Instant::now();

        let (catalog, load_report) = match store.load(DocumentKind::FoodDatabase)? {
            Some(body) => FoodCatalog::from_json(&body)?,
            None => (FoodCatalog::new(), LoadReport::default()),
        };
        let diary = match store.load(DocumentKind::FoodLog)? {
            Some(body) => DiaryStore::from_json(&body)?,
            None => DiaryStore::new(),
        };
        let profile = match store.load(DocumentKind::UserProfile)? {
            Some(body) => parse_profile(&body)?,
            None => UserProfile::default(),
        };

        info!(
            "event=service_open module=service status=ok foods={} days={} warnings={} duration_ms={}",
            catalog.len(),
            diary.day_count(),
            load_report.warnings.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            store,
            catalog,
            load_report,
            diary,
            history: UndoHistory::new(),
            profile,
            profile_modified: false,
        })
    }

    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    /// Report from the most recent catalog load.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn diary(&self) -> &DiaryStore {
        &self.diary
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-reads the food database, replacing the catalog only on success.
    ///
    /// A missing document leaves the current catalog in place.
    pub fn reload_catalog(&mut self) -> ServiceResult<&LoadReport> {
        if let Some(body) = self.store.load(DocumentKind::FoodDatabase)? {
            let (catalog, report) = FoodCatalog::from_json(&body)?;
            self.catalog = catalog;
            self.load_report = report;
        }
        Ok(&self.load_report)
    }

    pub fn add_food(&mut self, record: FoodRecord) -> ServiceResult<FoodId> {
        Ok(self.catalog.add(record)?)
    }

    pub fn set_food_calories(&mut self, name: &str, calories: f64) -> ServiceResult<()> {
        Ok(self.catalog.set_calories(name, calories)?)
    }

    pub fn search_foods<T: AsRef<str>>(&self, terms: &[T], match_all: bool) -> Vec<FoodRef<'_>> {
        self.catalog.search(terms, match_all)
    }

    /// Logs a food on `date` as an undoable command.
    pub fn log_food(
        &mut self,
        date: &DateKey,
        food_name: &str,
        servings: f64,
    ) -> ServiceResult<LogEntry> {
        let command = DiaryCommand::add_entry(&self.catalog, date.clone(), food_name, servings)?;
        let entry = command.entry().clone();
        self.history.execute(command, &mut self.diary)?;
        Ok(entry)
    }

    /// Deletes the entry at `index` on `date` as an undoable command.
    pub fn delete_entry(&mut self, date: &DateKey, index: usize) -> ServiceResult<LogEntry> {
        let command = DiaryCommand::delete_entry(&self.diary, date.clone(), index)?;
        let entry = command.entry().clone();
        self.history.execute(command, &mut self.diary)?;
        Ok(entry)
    }

    /// Reverses the newest diary command and returns its description.
    pub fn undo(&mut self) -> ServiceResult<String> {
        let command = self.history.undo(&mut self.diary)?;
        Ok(command.describe())
    }

    /// Undo history descriptions, newest first.
    pub fn undo_history(&self) -> Vec<String> {
        self.history.descriptions()
    }

    pub fn set_daily_profile(&mut self, date: DateKey, daily: DailyProfile) -> ServiceResult<()> {
        self.profile.set_daily_profile(date, daily)?;
        self.profile_modified = true;
        Ok(())
    }

    /// Replaces static profile fields via `update`, keeping the old profile
    /// when the result fails validation.
    pub fn update_profile(&mut self, update: impl FnOnce(&mut UserProfile)) -> ServiceResult<()> {
        let mut candidate = self.profile.clone();
        update(&mut candidate);
        candidate.validate()?;
        self.profile = candidate;
        self.profile_modified = true;
        Ok(())
    }

    pub fn calorie_summary(&self, date: &DateKey) -> CalorieSummary {
        calorie_summary(&self.profile, &self.diary, date)
    }

    /// Whether any document has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.catalog.is_modified() || self.diary.is_modified() || self.profile_modified
    }

    /// Writes all three documents.
    pub fn save(&mut self) -> ServiceResult<()> {
        let catalog_body = self.catalog.to_json()?;
        let diary_body = self.diary.to_json()?;
        let profile_body =
            serde_json::to_string_pretty(&self.profile).map_err(ServiceError::ProfileSerialization)?;

        self.store.save(DocumentKind::FoodDatabase, &catalog_body)?;
        self.catalog.mark_saved();
        self.store.save(DocumentKind::FoodLog, &diary_body)?;
        self.diary.mark_saved();
        self.store.save(DocumentKind::UserProfile, &profile_body)?;
        self.profile_modified = false;

        info!(
            "event=service_save module=service status=ok foods={} days={}",
            self.catalog.len(),
            self.diary.day_count()
        );
        Ok(())
    }

    /// Consumes the service and returns its store.
    pub fn into_store(self) -> S {
        self.store
    }
}

fn parse_profile(body: &str) -> ServiceResult<UserProfile> {
    let profile: UserProfile = serde_json::from_str(body).map_err(|err| {
        warn!("event=profile_load module=service status=error error_code=malformed_document");
        ServiceError::MalformedProfile(err.to_string())
    })?;
    profile
        .validate()
        .map_err(|err| ServiceError::MalformedProfile(err.to_string()))?;
    Ok(profile)
}
