//! # Storage Layer
//!
//! [`NoteStorage`] holds the primitives a storage medium must supply: lookups
//! and raw add/update/delete. It performs no validation. All business rules
//! (title uniqueness, id assignment, dirty-state checks) live in
//! [`crate::dao::NoteDao`], which wraps any `NoteStorage`.
//!
//! ## Implementations
//!
//! - [`memory::MemoryNoteStore`]: in-memory, no persistence. Used by tests and
//!   by the CLI's `--memory` flag.
//! - [`fs::FileNoteStore`]: one directory per store.
//!   - Metadata for all notes in `notes.json`
//!   - Each body in `note-{id}{ext}`, read lazily
//!
//! ## Storage Format
//!
//! For `FileNoteStore`:
//! ```text
//! notes/
//! ├── notes.json       # id, title and timestamps for every note
//! ├── note-1.txt       # body of note 1
//! └── kuebiko.toml     # optional application config
//! ```
//!
//! Lookups return `Ok(None)` for a miss. `Err` is reserved for failures of
//! the medium itself.

use crate::dao::{DaoParameter, DaoParams};
use crate::error::Result;
use crate::model::{Note, NoteId};
use std::collections::BTreeSet;

pub mod fs;
pub mod memory;

pub trait NoteStorage {
    /// Configuration keys this backend needs before use.
    fn required_parameters(&self) -> BTreeSet<DaoParameter> {
        BTreeSet::new()
    }

    /// Applies validated configuration. Only called when parameters were supplied.
    fn configure(&mut self, _params: &DaoParams) -> Result<()> {
        Ok(())
    }

    fn find_by_id(&self, id: NoteId) -> Result<Option<Note>>;

    /// Exact, case-sensitive title match.
    fn find_by_title(&self, title: &str) -> Result<Option<Note>>;

    /// Every stored note, in no particular order.
    fn list_notes(&self) -> Result<Vec<Note>>;

    /// Stores a note that already carries its assigned id.
    fn persist_add(&mut self, note: Note) -> Result<Note>;

    /// Replaces the stored note with the same id.
    fn persist_update(&mut self, note: Note) -> Result<Note>;

    fn persist_delete(&mut self, note: &Note) -> Result<()>;
}
