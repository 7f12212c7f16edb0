//! Food catalog: sole owner of every food entity.
//!
//! # Responsibility
//! - Own foods in an arena addressed by `FoodId`, indexed by unique name.
//! - Derive composite calories live from current component state.
//! - Provide duplicate-free insertion, lookup, keyword search and
//!   deterministic serialization.
//!
//! # Invariants
//! - No two foods share a name.
//! - Component handles point at lower arena positions than their owner.
//! - Iteration order is materialization order.
//!
//! # See also
//! - `resolve.rs` for persisted-definition loading.

mod resolve;

pub use resolve::{LoadReport, LoadWarning};

use crate::model::food::{
    Component, ComponentRecord, Food, FoodBody, FoodId, FoodKind, FoodRecord,
    FoodValidationError,
};
use log::{debug, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog operation failure.
#[derive(Debug)]
pub enum CatalogError {
    /// A food with this name already exists.
    DuplicateName(String),
    /// No food with this name exists.
    NotFound(String),
    /// A new composite names a component that is not in the catalog.
    ComponentNotFound { food: String, component: String },
    /// Operation only applies to atomic foods.
    NotAtomic(String),
    Validation(FoodValidationError),
    /// Persisted catalog document is structurally invalid.
    MalformedPersistentState(String),
    Serialization(serde_json::Error),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "a food named `{name}` already exists"),
            Self::NotFound(name) => write!(f, "food not found: `{name}`"),
            Self::ComponentNotFound { food, component } => {
                write!(f, "composite `{food}` references unknown food `{component}`")
            }
            Self::NotAtomic(name) => write!(f, "food `{name}` is composite; its calories are derived"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedPersistentState(message) => {
                write!(f, "malformed food database: {message}")
            }
            Self::Serialization(err) => write!(f, "failed to serialize food database: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FoodValidationError> for CatalogError {
    fn from(value: FoodValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Arena-backed food catalog.
#[derive(Debug, Default)]
pub struct FoodCatalog {
    foods: Vec<Food>,
    by_name: HashMap<String, FoodId>,
    modified: bool,
}

impl FoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether the catalog changed since it was loaded or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Looks up a food by exact name.
    pub fn get(&self, name: &str) -> CatalogResult<FoodRef<'_>> {
        self.by_name
            .get(name)
            .and_then(|id| self.food(*id))
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Looks up a food by handle.
    pub fn food(&self, id: FoodId) -> Option<FoodRef<'_>> {
        self.foods.get(id.0).map(|food| FoodRef {
            catalog: self,
            id,
            food,
        })
    }

    /// Iterates all foods in materialization order.
    pub fn foods(&self) -> impl Iterator<Item = FoodRef<'_>> + '_ {
        self.foods.iter().enumerate().map(move |(index, food)| FoodRef {
            catalog: self,
            id: FoodId(index),
            food,
        })
    }

    /// Adds a new food definition.
    ///
    /// Composite components must already exist; use
    /// [`FoodCatalog::from_json`] for definitions with forward references.
    ///
    /// # Errors
    /// - `DuplicateName` when the name is taken; the existing food is untouched.
    /// - `ComponentNotFound` when a composite names an unknown food.
    /// - `Validation` for blank names, invalid calories or servings.
    pub fn add(&mut self, record: FoodRecord) -> CatalogResult<FoodId> {
        record.validate()?;
        if self.contains(record.name()) {
            return Err(CatalogError::DuplicateName(record.name().to_string()));
        }

        let food = match record {
            FoodRecord::Basic {
                name,
                keywords,
                calories,
            } => Food::atomic(name, keywords, calories),
            FoodRecord::Composite {
                name,
                keywords,
                components,
                ..
            } => {
                let components = self.link_components(&name, &components)?;
                Food::composite(name, keywords, components)
            }
        };

        let kind = food.kind();
        let id = self.insert(food);
        self.modified = true;
        debug!(
            "event=catalog_add module=catalog status=ok kind={} index={}",
            kind,
            id.index()
        );
        Ok(id)
    }

    /// Replaces the per-serving calories of an atomic food.
    ///
    /// Every composite that transitively includes the food reflects the new
    /// value on its next read. Existing diary snapshots are unaffected.
    pub fn set_calories(&mut self, name: &str, calories: f64) -> CatalogResult<()> {
        if !calories.is_finite() || calories < 0.0 {
            return Err(CatalogError::Validation(FoodValidationError::InvalidCalories {
                food: name.to_string(),
                value: calories,
            }));
        }
        let id = *self
            .by_name
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        match self.foods.get_mut(id.0).map(|food| &mut food.body) {
            Some(FoodBody::Atomic { calories: current }) => *current = calories,
            Some(FoodBody::Composite { .. }) => {
                return Err(CatalogError::NotAtomic(name.to_string()))
            }
            None => return Err(CatalogError::NotFound(name.to_string())),
        }
        self.modified = true;
        Ok(())
    }

    /// Keyword search.
    ///
    /// Each term is matched case-insensitively as a substring of any keyword.
    /// With `match_all` every term must match; otherwise one matching term is
    /// enough. Blank terms are ignored and an all-blank query returns nothing.
    /// Results follow materialization order.
    pub fn search<S: AsRef<str>>(&self, terms: &[S], match_all: bool) -> Vec<FoodRef<'_>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        self.foods()
            .filter(|food| {
                let mut hits = terms.iter().map(|term| food.food.matches_term(term));
                if match_all {
                    hits.all(|hit| hit)
                } else {
                    hits.any(|hit| hit)
                }
            })
            .collect()
    }

    /// Persisted records for every food, in materialization order.
    pub fn to_records(&self) -> Vec<FoodRecord> {
        self.foods().map(|food| food.to_record()).collect()
    }

    /// Serializes the catalog as a pretty-printed JSON array.
    pub fn to_json(&self) -> CatalogResult<String> {
        let body =
            serde_json::to_string_pretty(&self.to_records()).map_err(CatalogError::Serialization)?;
        info!(
            "event=catalog_serialize module=catalog status=ok foods={}",
            self.len()
        );
        Ok(body)
    }

    /// Clears the modified flag after the caller persisted [`Self::to_json`].
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub(crate) fn insert(&mut self, food: Food) -> FoodId {
        let id = FoodId(self.foods.len());
        self.by_name.insert(food.name().to_string(), id);
        self.foods.push(food);
        id
    }

    pub(crate) fn id_of(&self, name: &str) -> Option<FoodId> {
        self.by_name.get(name).copied()
    }

    fn link_components(
        &self,
        owner: &str,
        components: &[ComponentRecord],
    ) -> CatalogResult<Vec<Component>> {
        components
            .iter()
            .map(|component| {
                let food = self.id_of(&component.name).ok_or_else(|| {
                    CatalogError::ComponentNotFound {
                        food: owner.to_string(),
                        component: component.name.clone(),
                    }
                })?;
                Ok(Component {
                    food,
                    servings: component.servings,
                })
            })
            .collect()
    }

    // Post-order walk with a per-call memo. Terminates because component
    // handles always point at lower positions.
    fn calories_of(&self, root: FoodId) -> f64 {
        let mut memo: HashMap<FoodId, f64> = HashMap::new();
        let mut stack = vec![root];

        while let Some(&id) = stack.last() {
            if memo.contains_key(&id) {
                stack.pop();
                continue;
            }
            let value = match self.foods.get(id.0).map(|food| &food.body) {
                Some(FoodBody::Atomic { calories }) => *calories,
                Some(FoodBody::Composite { components }) => {
                    if let Some(pending) = components
                        .iter()
                        .find(|component| !memo.contains_key(&component.food))
                    {
                        stack.push(pending.food);
                        continue;
                    }
                    components
                        .iter()
                        .map(|component| {
                            memo.get(&component.food).copied().unwrap_or(0.0) * component.servings
                        })
                        .sum()
                }
                None => 0.0,
            };
            memo.insert(id, value);
            stack.pop();
        }

        memo.get(&root).copied().unwrap_or(0.0)
    }
}

/// Borrowed view of one catalog food.
#[derive(Debug, Clone, Copy)]
pub struct FoodRef<'a> {
    catalog: &'a FoodCatalog,
    id: FoodId,
    food: &'a Food,
}

impl<'a> FoodRef<'a> {
    pub fn id(&self) -> FoodId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.food.name()
    }

    pub fn keywords(&self) -> &'a [String] {
        self.food.keywords()
    }

    pub fn kind(&self) -> FoodKind {
        self.food.kind()
    }

    /// Per-serving calories, derived live for composites.
    pub fn calories(&self) -> f64 {
        self.catalog.calories_of(self.id)
    }

    /// Resolved components with their servings; empty for atomic foods.
    pub fn components(&self) -> impl Iterator<Item = (FoodRef<'a>, f64)> + 'a {
        let catalog = self.catalog;
        self.food.components().iter().filter_map(move |component| {
            catalog
                .food(component.food)
                .map(|food| (food, component.servings))
        })
    }

    /// Persisted definition; composites reference components by name.
    pub fn to_record(&self) -> FoodRecord {
        match &self.food.body {
            FoodBody::Atomic { calories } => FoodRecord::Basic {
                name: self.name().to_string(),
                keywords: self.keywords().to_vec(),
                calories: *calories,
            },
            FoodBody::Composite { .. } => FoodRecord::Composite {
                name: self.name().to_string(),
                keywords: self.keywords().to_vec(),
                components: self
                    .components()
                    .map(|(food, servings)| ComponentRecord::new(food.name(), servings))
                    .collect(),
                calories: Some(self.calories()),
            },
        }
    }
}
