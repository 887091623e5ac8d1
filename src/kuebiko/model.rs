//! # Note Model
//!
//! A [`Note`] is a titled document with an integer identity, two timestamps and
//! a body that may be loaded lazily.
//!
//! ## Identity
//!
//! A note without an id is *new*: it was built by a client and has never been
//! persisted. The DAO assigns a [`NoteId`] when the note is added, and the id
//! never changes afterwards.
//!
//! ## Dirty Tracking
//!
//! Every note carries a snapshot of its last clean state. A note is *dirty*
//! when its title or text differ from that snapshot. Setting a field back to
//! its clean value makes the note clean again. The DAO takes a fresh snapshot
//! after each successful add or update.
//!
//! ## Lazy Text
//!
//! Backends that keep bodies apart from metadata hand out notes whose text is
//! read through a [`TextLoader`] on first access. Listing notes therefore never
//! touches the bodies.

use crate::error::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Identifier assigned to a note when it is first persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(NonZeroU32);

impl NoteId {
    /// Returns `None` for zero, which is reserved for "unassigned".
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deferred source for a note's body.
pub trait TextLoader: Send + Sync {
    fn load(&self) -> Result<String>;
}

impl<F> TextLoader for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn load(&self) -> Result<String> {
        self()
    }
}

#[derive(Clone)]
struct NoteText {
    value: OnceCell<String>,
    loader: Option<Arc<dyn TextLoader>>,
}

impl NoteText {
    fn loaded(text: String) -> Self {
        Self {
            value: OnceCell::with_value(text),
            loader: None,
        }
    }

    fn deferred(loader: Arc<dyn TextLoader>) -> Self {
        Self {
            value: OnceCell::new(),
            loader: Some(loader),
        }
    }

    fn get(&self) -> Result<&str> {
        self.value
            .get_or_try_init(|| match &self.loader {
                Some(loader) => loader.load(),
                None => Ok(String::new()),
            })
            .map(String::as_str)
    }

    fn peek(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }
}

impl fmt::Debug for NoteText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(text) => f.debug_tuple("Loaded").field(&text).finish(),
            None => f.write_str("Deferred"),
        }
    }
}

/// Title and text as of the last clean point. `text` is `None` when the body
/// had not been loaded at that time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    title: String,
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Note {
    id: Option<NoteId>,
    title: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    text: NoteText,
    text_edited: bool,
    clean: Snapshot,
}

impl Note {
    /// Builds a new, unpersisted note. Its clean snapshot is empty, so any
    /// non-empty title or text makes it dirty.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            created_at: now,
            modified_at: now,
            text: NoteText::loaded(text.into()),
            text_edited: false,
            clean: Snapshot {
                title: String::new(),
                text: Some(String::new()),
            },
        }
    }

    /// Rebuilds a stored note whose body is read on first access.
    pub fn persisted(
        id: NoteId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
        loader: Arc<dyn TextLoader>,
    ) -> Self {
        let title = title.into();
        Self {
            id: Some(id),
            clean: Snapshot {
                title: title.clone(),
                text: None,
            },
            title,
            created_at,
            modified_at,
            text: NoteText::deferred(loader),
            text_edited: false,
        }
    }

    pub fn id(&self) -> Option<NoteId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// The body, loading it on first access.
    pub fn text(&self) -> Result<&str> {
        self.text.get()
    }

    /// The body if it is already in memory.
    pub fn loaded_text(&self) -> Option<&str> {
        self.text.peek()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        // Capture the stored body so writing it back unchanged stays clean.
        if self.clean.text.is_none() && !self.text_edited {
            self.clean.text = self.text.get().ok().map(str::to_owned);
        }
        self.text = NoteText::loaded(text.into());
        self.text_edited = true;
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        if self.title != self.clean.title {
            return true;
        }
        match (self.clean.text.as_deref(), self.text.peek()) {
            (_, None) => false,
            (Some(clean), Some(current)) => clean != current,
            (None, Some(_)) => self.text_edited,
        }
    }

    pub(crate) fn assign_id(&mut self, id: NoteId) {
        self.id = Some(id);
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.modified_at = at;
    }

    /// Takes the current state as the new clean snapshot.
    pub(crate) fn mark_clean(&mut self) {
        self.clean = Snapshot {
            title: self.title.clone(),
            text: self.text.peek().map(str::to_owned),
        };
        self.text_edited = false;
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{} {}", id, self.title),
            None => write!(f, "(new) {}", self.title),
        }
    }
}
