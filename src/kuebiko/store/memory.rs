use super::NoteStorage;
use crate::error::{KuebikoError, Result};
use crate::model::{Note, NoteId};
use std::collections::BTreeMap;

/// In-memory storage for testing and throwaway sessions.
/// Does NOT persist data.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: BTreeMap<NoteId, Note>,
    simulate_write_error: bool,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error {
            return Err(KuebikoError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn stored_id(note: &Note) -> Result<NoteId> {
        note.id()
            .ok_or_else(|| KuebikoError::Store(format!("Note [{}] has no id", note)))
    }
}

impl NoteStorage for MemoryNoteStore {
    fn find_by_id(&self, id: NoteId) -> Result<Option<Note>> {
        Ok(self.notes.get(&id).cloned())
    }

    fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        Ok(self.notes.values().find(|n| n.title() == title).cloned())
    }

    fn list_notes(&self) -> Result<Vec<Note>> {
        Ok(self.notes.values().cloned().collect())
    }

    fn persist_add(&mut self, note: Note) -> Result<Note> {
        self.check_writable()?;
        let id = Self::stored_id(&note)?;
        if self.notes.contains_key(&id) {
            return Err(KuebikoError::Store(format!("Note id {} is already stored", id)));
        }
        self.notes.insert(id, note.clone());
        Ok(note)
    }

    fn persist_update(&mut self, note: Note) -> Result<Note> {
        self.check_writable()?;
        let id = Self::stored_id(&note)?;
        match self.notes.get_mut(&id) {
            Some(slot) => *slot = note.clone(),
            None => return Err(KuebikoError::NoteNotFound(note.to_string())),
        }
        Ok(note)
    }

    fn persist_delete(&mut self, note: &Note) -> Result<()> {
        self.check_writable()?;
        let id = Self::stored_id(note)?;
        if self.notes.remove(&id).is_none() {
            return Err(KuebikoError::NoteNotFound(note.to_string()));
        }
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::dao::NoteDao;

    /// A DAO over a memory store, pre-populated through the normal add path.
    pub struct DaoFixture {
        pub dao: NoteDao<MemoryNoteStore>,
    }

    impl Default for DaoFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DaoFixture {
        pub fn new() -> Self {
            Self {
                dao: NoteDao::new(MemoryNoteStore::new()),
            }
        }

        pub fn with_note(mut self, title: &str, text: &str) -> Self {
            self.dao.add_note(&Note::new(title, text)).unwrap();
            self
        }

        pub fn with_notes(mut self, count: usize) -> Self {
            for i in 0..count {
                let note = Note::new(format!("Test Note {}", i + 1), format!("Body {}", i + 1));
                self.dao.add_note(&note).unwrap();
            }
            self
        }
    }
}
