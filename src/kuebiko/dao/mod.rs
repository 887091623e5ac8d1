//! # Note DAO
//!
//! [`NoteDao`] is the persistence boundary for notes. It wraps any
//! [`NoteStorage`] and enforces the rules common to every backend before any
//! I/O happens:
//!
//! - configuration is checked against the backend's declared parameters
//! - added notes must be new and carry a unique, non-blank title
//! - titles stay non-blank on update
//! - updated notes must be persisted and dirty
//! - deleted notes must be persisted and still present
//! - identifiers come from a single, strictly increasing counter
//!
//! ## Two Kinds of Failure
//!
//! Passing a note in the wrong state (adding a persisted note, updating a
//! clean one) is a bug in the caller and panics. Everything else is returned
//! as a [`KuebikoError`]: `Configuration`, `Validation` and `NoteNotFound` for
//! rule violations, `Io`/`Serialization`/`Store` when the medium fails.

use crate::error::{KuebikoError, Result};
use crate::model::{Note, NoteId};
use crate::store::NoteStorage;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

mod params;

pub use params::{DaoParameter, DaoParams};

pub struct NoteDao<S: NoteStorage> {
    storage: S,
    /// Highest identifier handed out so far.
    last_id: AtomicU32,
}

impl<S: NoteStorage> NoteDao<S> {
    /// Wraps a storage backend without touching it. Call [`NoteDao::initialize`]
    /// before use when the backend already holds notes.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            last_id: AtomicU32::new(0),
        }
    }

    /// Wraps and initializes in one step.
    pub fn open(storage: S, params: Option<&DaoParams>) -> Result<Self> {
        let mut dao = Self::new(storage);
        dao.initialize(params)?;
        Ok(dao)
    }

    pub fn required_parameters(&self) -> BTreeSet<DaoParameter> {
        self.storage.required_parameters()
    }

    /// Checks `params` against the backend's declared requirements, configures
    /// the backend and seeds the id counter from what is already stored.
    pub fn initialize(&mut self, params: Option<&DaoParams>) -> Result<()> {
        let required = self.storage.required_parameters();

        match params {
            None if !required.is_empty() => {
                return Err(config_error(
                    "Parameters are required but none were provided.".to_string(),
                ));
            }
            None => {}
            Some(params) if required.is_empty() => {
                return Err(config_error(format!(
                    "Default initialization cannot use parameters [{}].",
                    params
                )));
            }
            Some(params) => {
                if let Some(missing) = required.iter().find(|p| params.get(**p).is_none()) {
                    return Err(config_error(format!(
                        "Parameter [{}] may not be null.",
                        missing
                    )));
                }
                self.storage.configure(params)?;
            }
        }

        let highest = self
            .storage
            .list_notes()?
            .iter()
            .filter_map(Note::id)
            .map(NoteId::get)
            .max()
            .unwrap_or(0);
        self.last_id.fetch_max(highest, Ordering::SeqCst);
        debug!("DAO initialized, last id {}", highest);
        Ok(())
    }

    pub fn find_note(&self, id: NoteId) -> Result<Option<Note>> {
        debug!("Looking up note by id {}", id);
        self.storage.find_by_id(id)
    }

    pub fn find_note_by_title(&self, title: &str) -> Result<Option<Note>> {
        debug!("Looking up note by title [{}]", title);
        self.storage.find_by_title(title)
    }

    pub fn notes(&self) -> Result<Vec<Note>> {
        self.storage.list_notes()
    }

    /// Persists a new note and returns the stored copy with its assigned id.
    ///
    /// # Panics
    /// If `note` already has an id.
    pub fn add_note(&mut self, note: &Note) -> Result<Note> {
        assert!(note.is_new(), "add_note requires a new note, got [{}]", note);
        check_title(note)?;

        if self.storage.find_by_title(note.title())?.is_some() {
            warn!("Rejected duplicate title [{}]", note.title());
            return Err(KuebikoError::Validation(format!(
                "A note with title [{}] already exists.",
                note.title()
            )));
        }

        let mut added = note.clone();
        added.assign_id(self.next_id()?);
        added.touch(Utc::now());
        added.mark_clean();

        let added = self.storage.persist_add(added)?;
        info!("Added note {}", added);
        Ok(added)
    }

    /// Persists pending changes of a stored note and returns the clean copy.
    ///
    /// # Panics
    /// If `note` is new or has no pending changes.
    pub fn update_note(&mut self, note: &Note) -> Result<Note> {
        let Some(id) = note.id() else {
            panic!("update_note requires a persisted note, got [{}]", note);
        };
        assert!(note.is_dirty(), "update_note requires pending changes on [{}]", note);
        check_title(note)?;

        if self.storage.find_by_id(id)?.is_none() {
            return Err(KuebikoError::NoteNotFound(format!("Note [{}] not found.", note)));
        }

        let mut updated = note.clone();
        updated.touch(Utc::now());
        updated.mark_clean();

        let updated = self.storage.persist_update(updated)?;
        info!("Updated note {}", updated);
        Ok(updated)
    }

    /// Removes a stored note.
    ///
    /// # Panics
    /// If `note` is new.
    pub fn delete_note(&mut self, note: &Note) -> Result<()> {
        let Some(id) = note.id() else {
            panic!("delete_note requires a persisted note, got [{}]", note);
        };

        // Titles are only unique at add time, so a renamed note may share its
        // title with an older one. The id decides which of them is meant.
        let present = match self.storage.find_by_title(note.title())? {
            Some(found) if found.id() == Some(id) => true,
            Some(_) => self
                .storage
                .find_by_id(id)?
                .is_some_and(|stored| stored.title() == note.title()),
            None => false,
        };
        if !present {
            return Err(KuebikoError::NoteNotFound(format!(
                "Passed note [{}] does not exist.",
                note
            )));
        }

        self.storage.persist_delete(note)?;
        info!("Deleted note {}", note);
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Once `u32::MAX` is handed out the counter stays there and every later
    /// call fails.
    fn next_id(&self) -> Result<NoteId> {
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .ok()
            .and_then(|previous| NoteId::new(previous + 1))
            .ok_or_else(|| KuebikoError::Store("Note identifiers exhausted".to_string()))
    }
}

fn check_title(note: &Note) -> Result<()> {
    if note.title().trim().is_empty() {
        warn!("Rejected blank title on {}", note);
        return Err(KuebikoError::Validation("Title cannot be empty".to_string()));
    }
    Ok(())
}

fn config_error(message: String) -> KuebikoError {
    warn!("{}", message);
    KuebikoError::Configuration(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::DaoFixture;
    use crate::store::memory::MemoryNoteStore;
    use std::collections::BTreeSet;

    /// Memory store that claims to need a directory.
    #[derive(Default)]
    struct NeedsDirectory {
        inner: MemoryNoteStore,
        configured_with: Option<String>,
    }

    impl NoteStorage for NeedsDirectory {
        fn required_parameters(&self) -> BTreeSet<DaoParameter> {
            BTreeSet::from([DaoParameter::Directory])
        }

        fn configure(&mut self, params: &DaoParams) -> Result<()> {
            self.configured_with = params.get(DaoParameter::Directory).map(str::to_owned);
            Ok(())
        }

        fn find_by_id(&self, id: NoteId) -> Result<Option<Note>> {
            self.inner.find_by_id(id)
        }

        fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
            self.inner.find_by_title(title)
        }

        fn list_notes(&self) -> Result<Vec<Note>> {
            self.inner.list_notes()
        }

        fn persist_add(&mut self, note: Note) -> Result<Note> {
            self.inner.persist_add(note)
        }

        fn persist_update(&mut self, note: Note) -> Result<Note> {
            self.inner.persist_update(note)
        }

        fn persist_delete(&mut self, note: &Note) -> Result<()> {
            self.inner.persist_delete(note)
        }
    }

    fn memory_dao() -> NoteDao<MemoryNoteStore> {
        NoteDao::new(MemoryNoteStore::new())
    }

    // --- Initialization ---

    #[test]
    fn initialize_without_requirements_accepts_no_params() {
        let mut dao = memory_dao();
        assert!(dao.initialize(None).is_ok());
        assert!(dao.required_parameters().is_empty());
    }

    #[test]
    fn initialize_rejects_params_when_none_are_declared() {
        let mut dao = memory_dao();
        let params = DaoParams::new().with(DaoParameter::Directory, "/tmp");
        let result = dao.initialize(Some(&params));
        assert!(matches!(result, Err(KuebikoError::Configuration(_))));
    }

    #[test]
    fn initialize_requires_params_when_declared() {
        let mut dao = NoteDao::new(NeedsDirectory::default());
        let result = dao.initialize(None);
        assert!(matches!(result, Err(KuebikoError::Configuration(_))));
    }

    #[test]
    fn initialize_reports_missing_key() {
        let mut dao = NoteDao::new(NeedsDirectory::default());
        let params = DaoParams::new().with(DaoParameter::FileExtension, ".md");
        let err = dao.initialize(Some(&params)).unwrap_err();
        assert!(err.to_string().contains("[directory]"));
        assert!(dao.storage().configured_with.is_none());
    }

    #[test]
    fn initialize_configures_backend_when_satisfied() {
        let params = DaoParams::new().with(DaoParameter::Directory, "/srv/notes");
        let dao = NoteDao::open(NeedsDirectory::default(), Some(&params)).unwrap();
        assert_eq!(dao.storage().configured_with.as_deref(), Some("/srv/notes"));
    }

    #[test]
    fn initialize_seeds_counter_from_existing_notes() {
        let storage = DaoFixture::new().with_notes(3).dao.storage;
        assert_eq!(storage.len(), 3);

        // A fresh DAO over the same storage must not reuse ids.
        let mut dao = NoteDao::open(storage, None).unwrap();
        let added = dao.add_note(&Note::new("Fourth", "")).unwrap();
        assert_eq!(added.id().unwrap().get(), 4);
    }

    // --- Add ---

    #[test]
    fn groceries_and_chores_example() {
        let mut dao = memory_dao();

        let groceries = dao.add_note(&Note::new("Groceries", "milk")).unwrap();
        assert_eq!(groceries.id().unwrap().get(), 1);

        let dup = dao.add_note(&Note::new("Groceries", "eggs"));
        assert!(matches!(dup, Err(KuebikoError::Validation(_))));

        let chores = dao.add_note(&Note::new("Chores", "")).unwrap();
        assert_eq!(chores.id().unwrap().get(), 2);
    }

    #[test]
    fn added_ids_strictly_increase() {
        let mut dao = memory_dao();
        let mut last = 0;
        for i in 0..10 {
            let note = dao.add_note(&Note::new(format!("Note {}", i), "")).unwrap();
            let id = note.id().unwrap().get();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn duplicate_title_leaves_store_unchanged() {
        let mut dao = DaoFixture::new().with_note("Groceries", "milk").dao;
        let before = dao.notes().unwrap().len();

        let _ = dao.add_note(&Note::new("Groceries", "other"));

        assert_eq!(dao.notes().unwrap().len(), before);
        let kept = dao.find_note_by_title("Groceries").unwrap().unwrap();
        assert_eq!(kept.text().unwrap(), "milk");
    }

    #[test]
    fn added_note_is_clean_and_round_trips() {
        let mut dao = memory_dao();
        let draft = Note::new("Groceries", "milk\neggs");
        assert!(draft.is_dirty());

        let added = dao.add_note(&draft).unwrap();
        assert!(!added.is_dirty());
        assert!(!added.is_new());

        let found = dao.find_note(added.id().unwrap()).unwrap().unwrap();
        assert_eq!(found.title(), "Groceries");
        assert_eq!(found.text().unwrap(), "milk\neggs");
    }

    #[test]
    #[should_panic(expected = "requires a new note")]
    fn add_of_persisted_note_panics() {
        let mut dao = memory_dao();
        let added = dao.add_note(&Note::new("Groceries", "")).unwrap();
        let _ = dao.add_note(&added);
    }

    #[test]
    fn add_surfaces_persistence_failure() {
        let mut storage = MemoryNoteStore::new();
        storage.set_simulate_write_error(true);
        let mut dao = NoteDao::new(storage);

        let err = dao.add_note(&Note::new("Groceries", "")).unwrap_err();
        assert!(err.is_persistence());
        assert!(dao.notes().unwrap().is_empty());
    }

    #[test]
    fn blank_title_is_rejected_on_add() {
        let mut dao = memory_dao();
        for title in ["", "   ", "\t\n"] {
            let result = dao.add_note(&Note::new(title, "body"));
            assert!(matches!(result, Err(KuebikoError::Validation(_))));
        }
        assert!(dao.notes().unwrap().is_empty());
    }

    #[test]
    fn exhausted_counter_never_reuses_ids() {
        let mut dao = memory_dao();
        dao.add_note(&Note::new("First", "")).unwrap();
        dao.last_id.store(u32::MAX - 1, Ordering::SeqCst);

        let last = dao.add_note(&Note::new("Second", "")).unwrap();
        assert_eq!(last.id().unwrap().get(), u32::MAX);

        for title in ["Third", "Fourth"] {
            let result = dao.add_note(&Note::new(title, ""));
            assert!(matches!(result, Err(KuebikoError::Store(_))));
        }
        let first = dao.find_note(NoteId::new(1).unwrap()).unwrap().unwrap();
        assert_eq!(first.title(), "First");
        assert_eq!(dao.notes().unwrap().len(), 2);
    }

    // --- Update ---

    #[test]
    fn update_stamps_time_and_clears_dirty() {
        let mut dao = memory_dao();
        let mut note = dao.add_note(&Note::new("Groceries", "milk")).unwrap();
        let before = note.modified_at();

        note.set_text("milk, bread");
        assert!(note.is_dirty());
        let updated = dao.update_note(&note).unwrap();

        assert!(!updated.is_dirty());
        assert!(updated.modified_at() >= before);
        let found = dao.find_note(updated.id().unwrap()).unwrap().unwrap();
        assert_eq!(found.text().unwrap(), "milk, bread");
    }

    #[test]
    #[should_panic(expected = "requires pending changes")]
    fn update_of_clean_note_panics() {
        let mut dao = memory_dao();
        let note = dao.add_note(&Note::new("Groceries", "")).unwrap();
        let _ = dao.update_note(&note);
    }

    #[test]
    #[should_panic(expected = "requires a persisted note")]
    fn update_of_new_note_panics() {
        let mut dao = memory_dao();
        let _ = dao.update_note(&Note::new("Draft", "text"));
    }

    #[test]
    fn update_of_removed_note_fails() {
        let mut dao = memory_dao();
        let mut note = dao.add_note(&Note::new("Groceries", "")).unwrap();
        dao.delete_note(&note).unwrap();

        note.set_title("Renamed");
        let result = dao.update_note(&note);
        assert!(matches!(result, Err(KuebikoError::NoteNotFound(_))));
    }

    #[test]
    fn update_may_share_a_title() {
        let mut dao = memory_dao();
        dao.add_note(&Note::new("A", "")).unwrap();
        let mut second = dao.add_note(&Note::new("B", "")).unwrap();

        second.set_title("A");
        let updated = dao.update_note(&second).unwrap();

        assert_eq!(updated.title(), "A");
        let titles: Vec<_> = dao.notes().unwrap().iter().map(|n| n.title().to_string()).collect();
        assert_eq!(titles, ["A", "A"]);
    }

    #[test]
    fn blank_title_is_rejected_on_update() {
        let mut dao = memory_dao();
        let mut note = dao.add_note(&Note::new("Groceries", "milk")).unwrap();

        note.set_title("  ");
        let result = dao.update_note(&note);

        assert!(matches!(result, Err(KuebikoError::Validation(_))));
        let kept = dao.find_note(note.id().unwrap()).unwrap().unwrap();
        assert_eq!(kept.title(), "Groceries");
    }

    // --- Delete ---

    #[test]
    fn delete_removes_from_both_lookups() {
        let mut dao = memory_dao();
        let note = dao.add_note(&Note::new("Groceries", "")).unwrap();

        dao.delete_note(&note).unwrap();

        assert!(dao.find_note(note.id().unwrap()).unwrap().is_none());
        assert!(dao.find_note_by_title("Groceries").unwrap().is_none());
    }

    #[test]
    fn delete_of_absent_note_fails_and_keeps_store() {
        let mut dao = DaoFixture::new().with_note("Chores", "").dao;
        let mut other = NoteDao::new(MemoryNoteStore::new());
        let stranger = other.add_note(&Note::new("Groceries", "")).unwrap();

        let result = dao.delete_note(&stranger);

        assert!(matches!(result, Err(KuebikoError::NoteNotFound(_))));
        assert_eq!(dao.notes().unwrap().len(), 1);
    }

    #[test]
    fn delete_does_not_remove_same_titled_note_with_other_id() {
        let mut dao = DaoFixture::new().with_note("Groceries", "").dao;
        let mut other = NoteDao::new(MemoryNoteStore::new());
        other.add_note(&Note::new("Filler", "")).unwrap();
        let impostor = other.add_note(&Note::new("Groceries", "")).unwrap();

        assert!(dao.delete_note(&impostor).is_err());
        assert!(dao.find_note_by_title("Groceries").unwrap().is_some());
    }

    #[test]
    fn delete_of_note_renamed_to_shared_title() {
        let mut dao = memory_dao();
        dao.add_note(&Note::new("A", "first")).unwrap();
        let mut second = dao.add_note(&Note::new("B", "second")).unwrap();

        second.set_title("A");
        let second = dao.update_note(&second).unwrap();
        dao.delete_note(&second).unwrap();

        assert!(dao.find_note(second.id().unwrap()).unwrap().is_none());
        let first = dao.find_note_by_title("A").unwrap().unwrap();
        assert_eq!(first.id().unwrap().get(), 1);
        assert_eq!(dao.notes().unwrap().len(), 1);
    }

    #[test]
    fn delete_by_stale_title_fails() {
        let mut dao = memory_dao();
        let original = dao.add_note(&Note::new("A", "")).unwrap();
        dao.add_note(&Note::new("B", "")).unwrap();
        let mut renamed = original.clone();
        renamed.set_title("B");
        dao.update_note(&renamed).unwrap();

        let result = dao.delete_note(&original);
        assert!(matches!(result, Err(KuebikoError::NoteNotFound(_))));
        assert_eq!(dao.notes().unwrap().len(), 2);
    }

    #[test]
    #[should_panic(expected = "requires a persisted note")]
    fn delete_of_new_note_panics() {
        let mut dao = memory_dao();
        let _ = dao.delete_note(&Note::new("Draft", ""));
    }
}
