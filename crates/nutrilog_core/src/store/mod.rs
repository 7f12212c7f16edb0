//! Document persistence capability.
//!
//! # Responsibility
//! - Define the load/save contract the service layer is built against.
//! - Keep raw file I/O out of catalog, diary and profile code.
//!
//! # Invariants
//! - `load` returns `Ok(None)` for a document that was never written; that is
//!   not an error.
//! - A failed `save` leaves the previously saved document readable.

mod file_store;
mod memory_store;

pub use file_store::FileDocumentStore;
pub use memory_store::MemoryDocumentStore;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted documents managed by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    FoodDatabase,
    FoodLog,
    UserProfile,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::FoodDatabase, Self::FoodLog, Self::UserProfile];

    /// Default file name inside a data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::FoodDatabase => "food_database.json",
            Self::FoodLog => "food_log.json",
            Self::UserProfile => "user_profile.json",
        }
    }

    /// Short label used in log events.
    pub fn label(self) -> &'static str {
        match self {
            Self::FoodDatabase => "food_database",
            Self::FoodLog => "food_log",
            Self::UserProfile => "user_profile",
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Load/save capability injected into the service layer.
pub trait DocumentStore {
    fn load(&self, kind: DocumentKind) -> StoreResult<Option<String>>;
    fn save(&mut self, kind: DocumentKind, body: &str) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn load(&self, kind: DocumentKind) -> StoreResult<Option<String>> {
        (**self).load(kind)
    }

    fn save(&mut self, kind: DocumentKind, body: &str) -> StoreResult<()> {
        (**self).save(kind, body)
    }
}
