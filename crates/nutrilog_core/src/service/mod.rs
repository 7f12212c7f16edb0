//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog, diary and profile operations into session-level
//!   APIs.
//! - Keep CLI callers decoupled from persistence details.

pub mod nutrition_service;
pub mod summary;
