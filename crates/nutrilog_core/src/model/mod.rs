//! Domain model for foods, diary entries and user profiles.
//!
//! # Responsibility
//! - Define canonical data structures used by catalog, diary and service code.
//! - Define persisted wire shapes next to the types they describe.
//!
//! # Invariants
//! - Food names are the only cross-document identity (diary entries refer to
//!   foods by name, never by handle).
//! - Diary and profile maps are keyed by validated `DateKey`s.

pub mod date;
pub mod entry;
pub mod food;
pub mod profile;
