//! Per-date food diary.
//!
//! # Responsibility
//! - Own ordered log entries per date.
//! - Snapshot calories from the catalog when an entry is created.
//! - Serialize to and from the persisted log document.
//!
//! # Invariants
//! - No date maps to an empty sequence.
//! - Entries are only mutated through this module; callers get shared
//!   slices.
//! - A failed operation leaves the diary unchanged.

mod command;

pub use command::{AddEntry, DeleteEntry, DiaryCommand, UndoHistory};

use crate::catalog::FoodCatalog;
use crate::model::date::DateKey;
use crate::model::entry::LogEntry;
use crate::model::food::is_valid_servings;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DiaryResult<T> = Result<T, DiaryError>;

#[derive(Debug)]
pub enum DiaryError {
    /// Food name is not in the catalog.
    FoodNotFound(String),
    InvalidServings(f64),
    /// Snapshot calories are not a finite number.
    InvalidCalories {
        food: String,
        value: f64,
    },
    IndexOutOfRange {
        date: DateKey,
        index: usize,
        len: usize,
    },
    /// The diary changed between command creation and execution.
    StaleCommand(String),
    NothingToUndo,
    /// Persisted log document is structurally invalid.
    MalformedPersistentState(String),
    Serialization(serde_json::Error),
}

impl Display for DiaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FoodNotFound(name) => write!(f, "food not found: `{name}`"),
            Self::InvalidServings(value) => {
                write!(f, "servings must be a positive number, got {value}")
            }
            Self::InvalidCalories { food, value } => write!(
                f,
                "calorie snapshot for `{food}` is not a finite number ({value})"
            ),
            Self::IndexOutOfRange { date, index, len } => write!(
                f,
                "entry index {index} is out of range for {date} ({len} entries)"
            ),
            Self::StaleCommand(description) => {
                write!(f, "diary changed before command could run: {description}")
            }
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::MalformedPersistentState(message) => write!(f, "malformed food log: {message}"),
            Self::Serialization(err) => write!(f, "failed to serialize food log: {err}"),
        }
    }
}

impl Error for DiaryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

/// Creates an entry for `servings` of `food_name` with a calorie snapshot.
pub fn snapshot_entry(
    catalog: &FoodCatalog,
    food_name: &str,
    servings: f64,
) -> DiaryResult<LogEntry> {
    if !is_valid_servings(servings) {
        return Err(DiaryError::InvalidServings(servings));
    }
    let food = catalog
        .get(food_name)
        .map_err(|_| DiaryError::FoodNotFound(food_name.to_string()))?;
    let calories = food.calories() * servings;
    if !calories.is_finite() {
        return Err(DiaryError::InvalidCalories {
            food: food.name().to_string(),
            value: calories,
        });
    }
    Ok(LogEntry::new(food.name(), servings, calories))
}

/// Date-keyed log of consumed foods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiaryStore {
    days: BTreeMap<DateKey, Vec<LogEntry>>,
    modified: bool,
}

impl DiaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `servings` of a catalog food on `date`.
    ///
    /// # Errors
    /// - `FoodNotFound` when the catalog has no such food.
    /// - `InvalidServings` for non-positive or non-finite servings.
    /// - `InvalidCalories` when the snapshot overflows.
    pub fn add_entry(
        &mut self,
        catalog: &FoodCatalog,
        date: &DateKey,
        food_name: &str,
        servings: f64,
    ) -> DiaryResult<LogEntry> {
        let entry = snapshot_entry(catalog, food_name, servings)?;
        self.append_entry(date.clone(), entry.clone());
        Ok(entry)
    }

    /// Removes the entry at `index` on `date`, dropping the date when emptied.
    pub fn delete_entry(&mut self, date: &DateKey, index: usize) -> DiaryResult<LogEntry> {
        let len = self.entries(date).len();
        let Some(entries) = self.days.get_mut(date).filter(|_| index < len) else {
            return Err(DiaryError::IndexOutOfRange {
                date: date.clone(),
                index,
                len,
            });
        };
        let removed = entries.remove(index);
        if entries.is_empty() {
            self.days.remove(date);
        }
        self.modified = true;
        Ok(removed)
    }

    /// Sum of calorie snapshots on `date`; zero for unknown dates.
    pub fn total_calories(&self, date: &DateKey) -> f64 {
        self.entries(date).iter().map(|entry| entry.calories).sum()
    }

    /// Entries on `date` in insertion order.
    pub fn entries(&self, date: &DateKey) -> &[LogEntry] {
        self.days.get(date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Dates with at least one entry, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = &DateKey> {
        self.days.keys()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub(crate) fn append_entry(&mut self, date: DateKey, entry: LogEntry) {
        self.days.entry(date).or_default().push(entry);
        self.modified = true;
    }

    /// Removes the newest entry matching `food` and `servings` within tolerance.
    pub(crate) fn remove_latest_match(
        &mut self,
        date: &DateKey,
        food: &str,
        servings: f64,
    ) -> Option<LogEntry> {
        let entries = self.days.get_mut(date)?;
        let position = entries
            .iter()
            .rposition(|entry| entry.matches(food, servings))?;
        let removed = entries.remove(position);
        if entries.is_empty() {
            self.days.remove(date);
        }
        self.modified = true;
        Some(removed)
    }

    /// Parses the persisted log document.
    ///
    /// Empty date arrays are dropped.
    ///
    /// # Errors
    /// - `MalformedPersistentState` for invalid JSON, invalid date keys or
    ///   entries with invalid servings or calories.
    pub fn from_json(source: &str) -> DiaryResult<Self> {
        let days: BTreeMap<DateKey, Vec<LogEntry>> = serde_json::from_str(source).map_err(|err| {
            warn!(
                "event=diary_load module=diary status=error error_code=malformed_document line={} column={}",
                err.line(),
                err.column()
            );
            DiaryError::MalformedPersistentState(err.to_string())
        })?;

        for (date, entries) in &days {
            for entry in entries {
                if !is_valid_servings(entry.servings) || !entry.calories.is_finite() {
                    return Err(DiaryError::MalformedPersistentState(format!(
                        "invalid entry for `{}` on {date}: servings={} calories={}",
                        entry.food, entry.servings, entry.calories
                    )));
                }
            }
        }

        let days: BTreeMap<DateKey, Vec<LogEntry>> = days
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .collect();
        info!(
            "event=diary_load module=diary status=ok days={}",
            days.len()
        );
        Ok(Self {
            days,
            modified: false,
        })
    }

    /// Replaces this diary with the parsed document, leaving it untouched on error.
    pub fn load_json(&mut self, source: &str) -> DiaryResult<usize> {
        *self = Self::from_json(source)?;
        Ok(self.day_count())
    }

    /// Serializes the diary as a pretty-printed JSON object keyed by date.
    pub fn to_json(&self) -> DiaryResult<String> {
        let body = serde_json::to_string_pretty(&self.days).map_err(DiaryError::Serialization)?;
        debug!(
            "event=diary_serialize module=diary status=ok days={}",
            self.days.len()
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::{DiaryError, DiaryStore};
    use crate::catalog::FoodCatalog;
    use crate::model::date::DateKey;
    use crate::model::food::FoodRecord;

    fn catalog() -> FoodCatalog {
        let mut catalog = FoodCatalog::new();
        catalog.add(FoodRecord::basic("Apple", &["fruit"], 95.0)).unwrap();
        catalog
    }

    fn day() -> DateKey {
        DateKey::parse("2024-01-01").unwrap()
    }

    #[test]
    fn add_entry_snapshots_calories() {
        let mut catalog = catalog();
        let mut diary = DiaryStore::new();
        let entry = diary.add_entry(&catalog, &day(), "Apple", 2.0).unwrap();
        assert_eq!(entry.calories, 190.0);

        catalog.set_calories("Apple", 50.0).unwrap();
        assert_eq!(diary.total_calories(&day()), 190.0);
    }

    #[test]
    fn add_entry_for_unknown_food_does_not_mutate() {
        let catalog = catalog();
        let mut diary = DiaryStore::new();
        let err = diary.add_entry(&catalog, &day(), "Pear", 1.0).unwrap_err();
        assert!(matches!(err, DiaryError::FoodNotFound(_)));
        assert_eq!(diary.day_count(), 0);
        assert!(!diary.is_modified());
    }

    #[test]
    fn add_entry_rejects_zero_servings() {
        let catalog = catalog();
        let mut diary = DiaryStore::new();
        assert!(matches!(
            diary.add_entry(&catalog, &day(), "Apple", 0.0),
            Err(DiaryError::InvalidServings(_))
        ));
    }

    #[test]
    fn add_entry_rejects_overflowing_snapshot() {
        let mut catalog = catalog();
        catalog.add(FoodRecord::basic("Dense", &[], 1e308)).unwrap();
        let mut diary = DiaryStore::new();

        let err = diary.add_entry(&catalog, &day(), "Dense", 10.0).unwrap_err();
        assert!(matches!(err, DiaryError::InvalidCalories { .. }));
        assert_eq!(diary.day_count(), 0);
        assert!(!diary.is_modified());

        diary.add_entry(&catalog, &day(), "Dense", 1.0).unwrap();
        let reloaded = DiaryStore::from_json(&diary.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.total_calories(&day()), 1e308);
    }

    #[test]
    fn delete_last_entry_drops_date() {
        let catalog = catalog();
        let mut diary = DiaryStore::new();
        diary.add_entry(&catalog, &day(), "Apple", 1.0).unwrap();
        diary.delete_entry(&day(), 0).unwrap();
        assert_eq!(diary.dates().count(), 0);
        assert_eq!(diary.total_calories(&day()), 0.0);
    }

    #[test]
    fn delete_out_of_range_reports_length() {
        let catalog = catalog();
        let mut diary = DiaryStore::new();
        diary.add_entry(&catalog, &day(), "Apple", 1.0).unwrap();
        match diary.delete_entry(&day(), 3).unwrap_err() {
            DiaryError::IndexOutOfRange { index, len, .. } => {
                assert_eq!(index, 3);
                assert_eq!(len, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(diary.entries(&day()).len(), 1);
    }

    #[test]
    fn remove_latest_match_prefers_newest_entry() {
        let catalog = catalog();
        let mut diary = DiaryStore::new();
        diary.add_entry(&catalog, &day(), "Apple", 1.0).unwrap();
        diary.add_entry(&catalog, &day(), "Apple", 2.0).unwrap();
        diary.add_entry(&catalog, &day(), "Apple", 1.0).unwrap();

        diary.remove_latest_match(&day(), "Apple", 1.0).unwrap();
        let servings: Vec<f64> = diary.entries(&day()).iter().map(|e| e.servings).collect();
        assert_eq!(servings, vec![1.0, 2.0]);
    }

    #[test]
    fn from_json_drops_empty_dates_and_rejects_bad_keys() {
        let diary = DiaryStore::from_json(r#"{"2024-01-01": [], "2024-01-02": [{"food": "Apple", "servings": 1, "calories": 95}]}"#)
            .unwrap();
        assert_eq!(diary.day_count(), 1);

        let err = DiaryStore::from_json(r#"{"yesterday": []}"#).unwrap_err();
        assert!(matches!(err, DiaryError::MalformedPersistentState(_)));
    }
}
