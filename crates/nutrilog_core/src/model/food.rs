//! Food domain model.
//!
//! # Responsibility
//! - Define the atomic/composite food shape owned by the catalog arena.
//! - Define the persisted food record and its validation rules.
//!
//! # Invariants
//! - A component handle always points at a food materialized before its
//!   owner, so the food graph is acyclic by construction.
//! - Composite calories are derived on read by the catalog, never stored.
//! - Keyword matching is case-insensitive substring matching.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Arena handle for a food owned by a [`crate::FoodCatalog`].
///
/// Handles are only minted by the catalog that owns the food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoodId(pub(crate) usize);

impl FoodId {
    /// Position of this food in catalog materialization order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Food variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodKind {
    /// Fixed calorie value per serving.
    Atomic,
    /// Calories derived from weighted components.
    Composite,
}

impl FoodKind {
    /// Persisted `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atomic => "basic",
            Self::Composite => "composite",
        }
    }
}

impl Display for FoodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted, non-owning reference from a composite to another food.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub food: FoodId,
    pub servings: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FoodBody {
    Atomic { calories: f64 },
    Composite { components: Vec<Component> },
}

/// Catalog-owned food entity.
///
/// Construction is crate-private: external callers add foods through
/// [`FoodRecord`] so component handles cannot point outside the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    name: String,
    keywords: Vec<String>,
    lowered_keywords: Vec<String>,
    pub(crate) body: FoodBody,
}

impl Food {
    pub(crate) fn atomic(name: String, keywords: Vec<String>, calories: f64) -> Self {
        Self::with_body(name, keywords, FoodBody::Atomic { calories })
    }

    pub(crate) fn composite(name: String, keywords: Vec<String>, components: Vec<Component>) -> Self {
        Self::with_body(name, keywords, FoodBody::Composite { components })
    }

    fn with_body(name: String, keywords: Vec<String>, body: FoodBody) -> Self {
        let lowered_keywords = keywords.iter().map(|value| value.to_lowercase()).collect();
        Self {
            name,
            keywords,
            lowered_keywords,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn kind(&self) -> FoodKind {
        match self.body {
            FoodBody::Atomic { .. } => FoodKind::Atomic,
            FoodBody::Composite { .. } => FoodKind::Composite,
        }
    }

    /// Per-serving calories of an atomic food; `None` for composites.
    pub fn base_calories(&self) -> Option<f64> {
        match self.body {
            FoodBody::Atomic { calories } => Some(calories),
            FoodBody::Composite { .. } => None,
        }
    }

    /// Component list in declaration order; empty for atomic foods.
    pub fn components(&self) -> &[Component] {
        match &self.body {
            FoodBody::Atomic { .. } => &[],
            FoodBody::Composite { components } => components,
        }
    }

    /// Returns whether any keyword contains `lowered_term`.
    ///
    /// The caller lowercases the term once per query.
    pub(crate) fn matches_term(&self, lowered_term: &str) -> bool {
        self.lowered_keywords
            .iter()
            .any(|keyword| keyword.contains(lowered_term))
    }
}

/// Persisted component reference (by name, not by value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub servings: f64,
}

impl ComponentRecord {
    pub fn new(name: impl Into<String>, servings: f64) -> Self {
        Self {
            name: name.into(),
            servings,
        }
    }
}

/// Persisted food definition.
///
/// Serialized with an internal `type` tag (`basic` | `composite`). The
/// composite `calories` field is an informational total written on save and
/// ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FoodRecord {
    #[serde(rename = "basic")]
    Basic {
        name: String,
        keywords: Vec<String>,
        calories: f64,
    },
    #[serde(rename = "composite")]
    Composite {
        name: String,
        keywords: Vec<String>,
        components: Vec<ComponentRecord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        calories: Option<f64>,
    },
}

impl FoodRecord {
    /// Builds an atomic definition.
    pub fn basic(name: impl Into<String>, keywords: &[&str], calories: f64) -> Self {
        Self::Basic {
            name: name.into(),
            keywords: owned_keywords(keywords),
            calories,
        }
    }

    /// Builds a composite definition from `(component name, servings)` pairs.
    pub fn composite(name: impl Into<String>, keywords: &[&str], components: &[(&str, f64)]) -> Self {
        Self::Composite {
            name: name.into(),
            keywords: owned_keywords(keywords),
            components: components
                .iter()
                .map(|(component, servings)| ComponentRecord::new(*component, *servings))
                .collect(),
            calories: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Basic { name, .. } | Self::Composite { name, .. } => name,
        }
    }

    pub fn kind(&self) -> FoodKind {
        match self {
            Self::Basic { .. } => FoodKind::Atomic,
            Self::Composite { .. } => FoodKind::Composite,
        }
    }

    /// Validates record-level invariants.
    ///
    /// Cross-record rules (unique names, resolvable components) belong to the
    /// catalog.
    pub fn validate(&self) -> Result<(), FoodValidationError> {
        let name = self.name();
        if name.trim().is_empty() {
            return Err(FoodValidationError::EmptyName);
        }

        match self {
            Self::Basic { calories, .. } => {
                if !calories.is_finite() || *calories < 0.0 {
                    return Err(FoodValidationError::InvalidCalories {
                        food: name.to_string(),
                        value: *calories,
                    });
                }
            }
            Self::Composite { components, .. } => {
                for component in components {
                    if component.name.trim().is_empty() {
                        return Err(FoodValidationError::EmptyComponentName {
                            food: name.to_string(),
                        });
                    }
                    if !is_valid_servings(component.servings) {
                        return Err(FoodValidationError::InvalidServings {
                            food: name.to_string(),
                            component: component.name.clone(),
                            value: component.servings,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Returns whether `servings` is a usable positive multiplier.
pub fn is_valid_servings(servings: f64) -> bool {
    servings.is_finite() && servings > 0.0
}

fn owned_keywords(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|value| (*value).to_string()).collect()
}

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FoodValidationError {
    EmptyName,
    InvalidCalories {
        food: String,
        value: f64,
    },
    EmptyComponentName {
        food: String,
    },
    InvalidServings {
        food: String,
        component: String,
        value: f64,
    },
}

impl Display for FoodValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "food name must not be blank"),
            Self::InvalidCalories { food, value } => {
                write!(f, "food `{food}` has invalid calories {value}; expected a finite value >= 0")
            }
            Self::EmptyComponentName { food } => {
                write!(f, "composite `{food}` has a component with a blank name")
            }
            Self::InvalidServings {
                food,
                component,
                value,
            } => write!(
                f,
                "composite `{food}` uses {value} servings of `{component}`; expected a finite value > 0"
            ),
        }
    }
}

impl Error for FoodValidationError {}

#[cfg(test)]
mod tests {
    use super::{Food, FoodRecord, FoodValidationError};

    #[test]
    fn keyword_match_ignores_case() {
        let food = Food::atomic(
            "Greek Yogurt".to_string(),
            vec!["Dairy".to_string(), "High-Protein".to_string()],
            100.0,
        );
        assert!(food.matches_term("protein"));
        assert!(food.matches_term("dai"));
        assert!(!food.matches_term("fruit"));
    }

    #[test]
    fn validate_rejects_non_positive_servings() {
        let record = FoodRecord::composite("Toast", &[], &[("Bread", 0.0)]);
        let err = record.validate().unwrap_err();
        assert!(matches!(err, FoodValidationError::InvalidServings { .. }));
    }

    #[test]
    fn validate_rejects_negative_calories() {
        let record = FoodRecord::basic("Mystery", &[], -5.0);
        assert!(matches!(
            record.validate(),
            Err(FoodValidationError::InvalidCalories { .. })
        ));
    }

    #[test]
    fn composite_calories_are_not_required_in_wire_format() {
        let value = serde_json::json!({
            "name": "Toast",
            "keywords": ["breakfast"],
            "type": "composite",
            "components": [{"name": "Bread", "servings": 2.0}]
        });
        let record: FoodRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record, FoodRecord::composite("Toast", &["breakfast"], &[("Bread", 2.0)]));
    }
}
