//! Reversible diary commands and the undo history.
//!
//! # Responsibility
//! - Capture enough state at creation time to reverse each diary mutation.
//! - Keep executed commands on a strict LIFO history.
//!
//! # Invariants
//! - A command is executed at most once: `UndoHistory::execute` takes it by
//!   value, runs it and pushes it in one step.
//! - Undo consumes the newest command; there is no redo.
//! - Commands hold captured values, never references into the diary.
//! - Command payloads are opaque; the only way to build one is through the
//!   validating constructors.
//! - Undoing an add removes the newest matching entry (same food name,
//!   servings within tolerance), not a remembered position.
//! - Undoing a delete appends the captured entry at the end of the date.

use super::{snapshot_entry, DiaryError, DiaryResult, DiaryStore};
use crate::catalog::FoodCatalog;
use crate::model::date::DateKey;
use crate::model::entry::LogEntry;
use log::{debug, warn};

/// Captured state of an add.
///
/// Only built by [`DiaryCommand::add_entry`], so the entry always names a
/// catalog food with valid servings and a finite snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AddEntry {
    date: DateKey,
    entry: LogEntry,
}

/// Captured state of a delete: the position and the entry found there.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteEntry {
    date: DateKey,
    index: usize,
    entry: LogEntry,
}

impl DeleteEntry {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Diary mutation with its captured inverse state.
#[derive(Debug, Clone, PartialEq)]
pub enum DiaryCommand {
    AddEntry(AddEntry),
    DeleteEntry(DeleteEntry),
}

impl DiaryCommand {
    /// Prepares an add, snapshotting calories from the catalog now.
    pub fn add_entry(
        catalog: &FoodCatalog,
        date: DateKey,
        food_name: &str,
        servings: f64,
    ) -> DiaryResult<Self> {
        let entry = snapshot_entry(catalog, food_name, servings)?;
        Ok(Self::AddEntry(AddEntry { date, entry }))
    }

    /// Prepares a delete, capturing the entry currently at `index`.
    pub fn delete_entry(diary: &DiaryStore, date: DateKey, index: usize) -> DiaryResult<Self> {
        let entries = diary.entries(&date);
        let Some(entry) = entries.get(index).cloned() else {
            return Err(DiaryError::IndexOutOfRange {
                len: entries.len(),
                date,
                index,
            });
        };
        Ok(Self::DeleteEntry(DeleteEntry { date, index, entry }))
    }

    pub fn date(&self) -> &DateKey {
        match self {
            Self::AddEntry(AddEntry { date, .. }) | Self::DeleteEntry(DeleteEntry { date, .. }) => {
                date
            }
        }
    }

    /// Entry added or removed by this command.
    pub fn entry(&self) -> &LogEntry {
        match self {
            Self::AddEntry(AddEntry { entry, .. }) | Self::DeleteEntry(DeleteEntry { entry, .. }) => {
                entry
            }
        }
    }

    /// Human-readable summary for undo listings.
    pub fn describe(&self) -> String {
        match self {
            Self::AddEntry(AddEntry { date, entry }) => format!(
                "Add {} serving(s) of {} ({} calories) on {}",
                entry.servings, entry.food, entry.calories, date
            ),
            Self::DeleteEntry(DeleteEntry { date, entry, .. }) => format!(
                "Delete {} serving(s) of {} from {}",
                entry.servings, entry.food, date
            ),
        }
    }

    fn execute(&self, diary: &mut DiaryStore) -> DiaryResult<()> {
        match self {
            Self::AddEntry(AddEntry { date, entry }) => {
                diary.append_entry(date.clone(), entry.clone());
                Ok(())
            }
            Self::DeleteEntry(DeleteEntry { date, index, entry }) => {
                if diary.entries(date).get(*index) != Some(entry) {
                    return Err(DiaryError::StaleCommand(self.describe()));
                }
                diary.delete_entry(date, *index).map(|_| ())
            }
        }
    }

    fn undo(&self, diary: &mut DiaryStore) {
        match self {
            Self::AddEntry(AddEntry { date, entry }) => {
                if diary
                    .remove_latest_match(date, &entry.food, entry.servings)
                    .is_none()
                {
                    warn!("event=diary_undo module=diary status=noop reason=entry_not_found kind=add");
                }
            }
            Self::DeleteEntry(DeleteEntry { date, entry, .. }) => {
                diary.append_entry(date.clone(), entry.clone());
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::AddEntry(_) => "add",
            Self::DeleteEntry(_) => "delete",
        }
    }
}

/// LIFO stack of executed diary commands.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    commands: Vec<DiaryCommand>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `command` against `diary` and records it for undo.
    ///
    /// A command that fails to execute is not recorded.
    pub fn execute(&mut self, command: DiaryCommand, diary: &mut DiaryStore) -> DiaryResult<()> {
        command.execute(diary)?;
        debug!(
            "event=diary_command module=diary status=ok kind={} depth={}",
            command.kind(),
            self.commands.len() + 1
        );
        self.commands.push(command);
        Ok(())
    }

    /// Reverses the newest command and returns it.
    ///
    /// # Errors
    /// - `NothingToUndo` when the history is empty.
    pub fn undo(&mut self, diary: &mut DiaryStore) -> DiaryResult<DiaryCommand> {
        let command = self.commands.pop().ok_or(DiaryError::NothingToUndo)?;
        command.undo(diary);
        debug!(
            "event=diary_undo module=diary status=ok kind={} depth={}",
            command.kind(),
            self.commands.len()
        );
        Ok(command)
    }

    /// Newest command, if any.
    pub fn peek(&self) -> Option<&DiaryCommand> {
        self.commands.last()
    }

    /// Command descriptions, newest first.
    pub fn descriptions(&self) -> Vec<String> {
        self.commands.iter().rev().map(DiaryCommand::describe).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
