//! # Note Manager
//!
//! [`NoteManager`] sits between a front end and the [`NoteDao`]. It answers
//! the queries a note list needs (titles, sorted and filtered notes), routes
//! saves to add or update, and owns the "unsaved changes" flag.
//!
//! Front ends register callbacks with [`NoteManager::subscribe`] instead of
//! polling. `ManagerEvent::UnsavedChanges` fires only when the flag actually
//! flips; the other events fire after each successful write.

use crate::dao::NoteDao;
use crate::error::Result;
use crate::model::{Note, NoteId};
use crate::store::NoteStorage;
use log::debug;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    UnsavedChanges(bool),
    NoteAdded(NoteId),
    NoteUpdated(NoteId),
    NoteDeleted(NoteId),
}

/// Handle returned by [`NoteManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ManagerEvent)>;

pub struct NoteManager<S: NoteStorage> {
    dao: NoteDao<S>,
    unsaved: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: NoteStorage> NoteManager<S> {
    pub fn new(dao: NoteDao<S>) -> Self {
        Self {
            dao,
            unsaved: false,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn dao(&self) -> &NoteDao<S> {
        &self.dao
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ManagerEvent) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Reflects the editor's active note in the unsaved-changes flag.
    pub fn track(&mut self, note: &Note) {
        self.set_unsaved(note.is_dirty());
    }

    pub fn note_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .notes()?
            .into_iter()
            .map(|n| n.title().to_string())
            .collect())
    }

    /// All notes, ordered by title ignoring case.
    pub fn notes(&self) -> Result<Vec<Note>> {
        let mut notes = self.dao.notes()?;
        notes.sort_by(|a, b| compare_titles(a.title(), b.title()));
        Ok(notes)
    }

    /// Notes matching `term`, best match first. A blank term matches everything.
    ///
    /// Ranking: exact title, then title substring, then body substring. Ties go
    /// to the shorter title.
    pub fn filter_notes(&self, term: &str) -> Result<Vec<Note>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.notes();
        }

        let mut matches: Vec<(Note, u8)> = Vec::new();
        for note in self.dao.notes()? {
            let title = note.title().to_lowercase();
            let rank = if title == term {
                1
            } else if title.contains(&term) {
                2
            } else if note.text()?.to_lowercase().contains(&term) {
                3
            } else {
                continue;
            };
            matches.push((note, rank));
        }

        matches.sort_by(|(a, rank_a), (b, rank_b)| {
            rank_a
                .cmp(rank_b)
                .then_with(|| a.title().len().cmp(&b.title().len()))
                .then_with(|| compare_titles(a.title(), b.title()))
        });
        Ok(matches.into_iter().map(|(note, _)| note).collect())
    }

    pub fn find_note(&self, id: NoteId) -> Result<Option<Note>> {
        self.dao.find_note(id)
    }

    pub fn find_note_by_title(&self, title: &str) -> Result<Option<Note>> {
        self.dao.find_note_by_title(title)
    }

    /// Returns the note titled `title`, adding an empty one when none exists.
    /// The flag is `true` when the note was just created.
    pub fn open_or_create(&mut self, title: &str) -> Result<(Note, bool)> {
        if let Some(note) = self.dao.find_note_by_title(title)? {
            return Ok((note, false));
        }
        let created = self.save_note(&Note::new(title, ""))?;
        Ok((created, true))
    }

    /// Adds a new note or updates a dirty one. A clean persisted note is
    /// returned as is.
    pub fn save_note(&mut self, note: &Note) -> Result<Note> {
        let saved = if note.is_new() {
            let added = self.dao.add_note(note)?;
            self.notify_written(ManagerEvent::NoteAdded, &added);
            added
        } else if note.is_dirty() {
            let updated = self.dao.update_note(note)?;
            self.notify_written(ManagerEvent::NoteUpdated, &updated);
            updated
        } else {
            debug!("Nothing to save for {}", note);
            note.clone()
        };
        self.set_unsaved(false);
        Ok(saved)
    }

    pub fn delete_note(&mut self, note: &Note) -> Result<()> {
        self.dao.delete_note(note)?;
        self.notify_written(ManagerEvent::NoteDeleted, note);
        self.set_unsaved(false);
        Ok(())
    }

    fn set_unsaved(&mut self, unsaved: bool) {
        if self.unsaved == unsaved {
            return;
        }
        self.unsaved = unsaved;
        self.emit(ManagerEvent::UnsavedChanges(unsaved));
    }

    fn notify_written(&mut self, event: fn(NoteId) -> ManagerEvent, note: &Note) {
        if let Some(id) = note.id() {
            self.emit(event(id));
        }
    }

    fn emit(&mut self, event: ManagerEvent) {
        debug!("Manager event {:?}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
