//! Persisted food definitions to a live catalog.
//!
//! # Responsibility
//! - Materialize atomic definitions immediately and stage composites.
//! - Resolve staged composites depth-first so every component is
//!   materialized before the composite that uses it.
//! - Degrade instead of failing on missing or cyclic references, reporting
//!   every dropped component.
//!
//! # Invariants
//! - Each staged composite is in exactly one state: pending, in progress or
//!   resolved.
//! - Resolution walks an explicit frame stack; nesting depth of composites
//!   never grows the call stack.
//! - Structural errors abort the whole load before any catalog is returned.

use super::{CatalogError, CatalogResult, FoodCatalog};
use crate::model::food::{Component, ComponentRecord, Food, FoodId, FoodRecord};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Non-fatal issue recorded while loading definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Component name is neither materialized nor staged; dropped.
    MissingComponent { composite: String, component: String },
    /// Component is still being resolved higher up the chain; dropped.
    UnresolvedCycle { composite: String, component: String },
    /// A later definition reused an existing name; skipped.
    DuplicateDefinition { name: String },
}

impl LoadWarning {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingComponent { .. } => "missing_component",
            Self::UnresolvedCycle { .. } => "unresolved_cycle",
            Self::DuplicateDefinition { .. } => "duplicate_definition",
        }
    }
}

impl Display for LoadWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingComponent {
                composite,
                component,
            } => write!(
                f,
                "component `{component}` not found for composite food `{composite}`; skipped"
            ),
            Self::UnresolvedCycle {
                composite,
                component,
            } => write!(
                f,
                "component `{component}` of composite food `{composite}` forms a reference cycle; skipped"
            ),
            Self::DuplicateDefinition { name } => {
                write!(f, "duplicate definition of `{name}`; later definition skipped")
            }
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of materialized foods.
    pub count: usize,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl FoodCatalog {
    /// Builds a catalog from a persisted JSON array of food definitions.
    ///
    /// # Errors
    /// - `MalformedPersistentState` when the document is not a valid array of
    ///   definitions or a definition violates record invariants.
    pub fn from_json(source: &str) -> CatalogResult<(Self, LoadReport)> {
        let records: Vec<FoodRecord> = serde_json::from_str(source).map_err(|err| {
            warn!(
                "event=catalog_load module=catalog status=error error_code=malformed_document line={} column={}",
                err.line(),
                err.column()
            );
            CatalogError::MalformedPersistentState(err.to_string())
        })?;
        Self::from_records(records)
    }

    /// Builds a catalog from definitions in any order.
    ///
    /// Missing and cyclic component references are dropped from their
    /// composite and reported in [`LoadReport::warnings`].
    pub fn from_records(records: Vec<FoodRecord>) -> CatalogResult<(Self, LoadReport)> {
        let started_at = Instant::now();
        let mut catalog = FoodCatalog::new();
        let mut staging = Staging::default();
        let mut warnings = Vec::new();

        for record in records {
            record
                .validate()
                .map_err(|err| CatalogError::MalformedPersistentState(err.to_string()))?;
            if catalog.contains(record.name()) || staging.contains(record.name()) {
                warnings.push(LoadWarning::DuplicateDefinition {
                    name: record.name().to_string(),
                });
                continue;
            }

            match record {
                FoodRecord::Basic {
                    name,
                    keywords,
                    calories,
                } => {
                    catalog.insert(Food::atomic(name, keywords, calories));
                }
                FoodRecord::Composite {
                    name,
                    keywords,
                    components,
                    ..
                } => staging.stage(name, keywords, components),
            }
        }

        let staged_count = staging.len();
        let mut resolver = Resolver {
            catalog: &mut catalog,
            staging,
            warnings,
        };
        for position in 0..staged_count {
            resolver.resolve(position);
        }
        let warnings = resolver.warnings;

        for warning in &warnings {
            warn!(
                "event=catalog_resolve module=catalog status=degraded reason={}",
                warning.code()
            );
        }
        info!(
            "event=catalog_load module=catalog status=ok foods={} composites={} warnings={} duration_ms={}",
            catalog.len(),
            staged_count,
            warnings.len(),
            started_at.elapsed().as_millis()
        );

        catalog.modified = false;
        let report = LoadReport {
            count: catalog.len(),
            warnings,
        };
        Ok((catalog, report))
    }

    /// Replaces this catalog with definitions parsed from `source`.
    ///
    /// On error the current contents are left untouched.
    pub fn load_json(&mut self, source: &str) -> CatalogResult<LoadReport> {
        let (catalog, report) = Self::from_json(source)?;
        *self = catalog;
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Pending,
    InProgress,
    Resolved,
}

#[derive(Debug)]
struct StagedComposite {
    name: String,
    keywords: Vec<String>,
    components: Vec<ComponentRecord>,
    state: StageState,
}

#[derive(Debug, Default)]
struct Staging {
    composites: Vec<StagedComposite>,
    positions: HashMap<String, usize>,
}

impl Staging {
    fn stage(&mut self, name: String, keywords: Vec<String>, components: Vec<ComponentRecord>) {
        self.positions.insert(name.clone(), self.composites.len());
        self.composites.push(StagedComposite {
            name,
            keywords,
            components,
            state: StageState::Pending,
        });
    }

    fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    fn len(&self) -> usize {
        self.composites.len()
    }
}

/// Where a component name currently stands.
enum Lookup {
    Materialized(FoodId),
    Pending(usize),
    InProgress,
    Missing,
}

/// One composite under construction.
struct Frame {
    position: usize,
    next: usize,
    components: Vec<Component>,
    /// Servings the parent frame applies to this composite.
    servings_in_parent: f64,
}

impl Frame {
    fn new(position: usize, servings_in_parent: f64) -> Self {
        Self {
            position,
            next: 0,
            components: Vec::new(),
            servings_in_parent,
        }
    }
}

struct Resolver<'a> {
    catalog: &'a mut FoodCatalog,
    staging: Staging,
    warnings: Vec<LoadWarning>,
}

impl Resolver<'_> {
    fn resolve(&mut self, root: usize) {
        if self.staging.composites[root].state != StageState::Pending {
            return;
        }
        self.staging.composites[root].state = StageState::InProgress;
        let mut stack = vec![Frame::new(root, 0.0)];

        while let Some(frame) = stack.last_mut() {
            let owner = frame.position;
            let Some(reference) = self.staging.composites[owner].components.get(frame.next) else {
                let components = std::mem::take(&mut frame.components);
                let servings_in_parent = frame.servings_in_parent;
                stack.pop();
                let id = self.materialize(owner, components);
                if let Some(parent) = stack.last_mut() {
                    parent.components.push(Component {
                        food: id,
                        servings: servings_in_parent,
                    });
                    parent.next += 1;
                }
                continue;
            };

            let servings = reference.servings;
            match self.lookup(&reference.name) {
                Lookup::Materialized(food) => {
                    frame.components.push(Component { food, servings });
                    frame.next += 1;
                }
                Lookup::Pending(child) => {
                    self.staging.composites[child].state = StageState::InProgress;
                    stack.push(Frame::new(child, servings));
                }
                Lookup::InProgress => {
                    self.drop_reference(owner, frame.next, true);
                    frame.next += 1;
                }
                Lookup::Missing => {
                    self.drop_reference(owner, frame.next, false);
                    frame.next += 1;
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Lookup {
        if let Some(id) = self.catalog.id_of(name) {
            return Lookup::Materialized(id);
        }
        match self.staging.positions.get(name) {
            Some(&position) => match self.staging.composites[position].state {
                StageState::Pending => Lookup::Pending(position),
                StageState::InProgress => Lookup::InProgress,
                // Resolved composites are already in the catalog index.
                StageState::Resolved => Lookup::Missing,
            },
            None => Lookup::Missing,
        }
    }

    fn drop_reference(&mut self, owner: usize, index: usize, cyclic: bool) {
        let staged = &self.staging.composites[owner];
        let composite = staged.name.clone();
        let component = staged
            .components
            .get(index)
            .map(|reference| reference.name.clone())
            .unwrap_or_default();
        debug!(
            "event=catalog_resolve module=catalog status=skip cyclic={} owner_index={} component_index={}",
            cyclic, owner, index
        );
        self.warnings.push(if cyclic {
            LoadWarning::UnresolvedCycle {
                composite,
                component,
            }
        } else {
            LoadWarning::MissingComponent {
                composite,
                component,
            }
        });
    }

    fn materialize(&mut self, position: usize, components: Vec<Component>) -> FoodId {
        let staged = &mut self.staging.composites[position];
        staged.state = StageState::Resolved;
        let food = Food::composite(
            staged.name.clone(),
            std::mem::take(&mut staged.keywords),
            components,
        );
        self.catalog.insert(food)
    }
}
