use super::NoteStorage;
use crate::dao::{DaoParameter, DaoParams};
use crate::error::{KuebikoError, Result};
use crate::model::{Note, NoteId, TextLoader};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INDEX_FILENAME: &str = "notes.json";
const DEFAULT_FILE_EXT: &str = ".txt";

/// One entry of `notes.json`. Bodies live in their own files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NoteRecord {
    id: NoteId,
    title: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl NoteRecord {
    fn from_note(note: &Note) -> Result<Self> {
        let id = note
            .id()
            .ok_or_else(|| KuebikoError::Store(format!("Note [{}] has no id", note)))?;
        Ok(Self {
            id,
            title: note.title().to_string(),
            created_at: note.created_at(),
            modified_at: note.modified_at(),
        })
    }
}

/// Directory-backed storage. Unusable until configured with a directory.
#[derive(Debug, Clone)]
pub struct FileNoteStore {
    root: Option<PathBuf>,
    file_ext: String,
}

impl Default for FileNoteStore {
    fn default() -> Self {
        Self {
            root: None,
            file_ext: DEFAULT_FILE_EXT.to_string(),
        }
    }
}

impl FileNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    pub fn root(&self) -> Result<&Path> {
        self.root
            .as_deref()
            .ok_or_else(|| KuebikoError::Store("File store has no directory configured".to_string()))
    }

    /// Path of the body file for a note.
    pub fn note_path(&self, id: NoteId) -> Result<PathBuf> {
        Ok(self.root()?.join(format!("note-{}{}", id, self.file_ext)))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(KuebikoError::Io)?;
        }
        Ok(())
    }

    fn load_index(&self) -> Result<Vec<NoteRecord>> {
        let index_file = self.root()?.join(INDEX_FILENAME);
        if !index_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(index_file).map_err(KuebikoError::Io)?;
        let records: Vec<NoteRecord> =
            serde_json::from_str(&content).map_err(KuebikoError::Serialization)?;
        Ok(records)
    }

    fn save_index(&self, records: &mut [NoteRecord]) -> Result<()> {
        let root = self.root()?;
        self.ensure_dir(root)?;
        records.sort_by_key(|r| r.id);
        let content = serde_json::to_string_pretty(records).map_err(KuebikoError::Serialization)?;
        write_atomic(root, &root.join(INDEX_FILENAME), &content)
    }

    fn write_text(&self, id: NoteId, text: &str) -> Result<()> {
        let root = self.root()?;
        self.ensure_dir(root)?;
        write_atomic(root, &self.note_path(id)?, text)
    }

    fn to_note(&self, record: NoteRecord) -> Result<Note> {
        let path = self.note_path(record.id)?;
        let loader: Arc<dyn TextLoader> = Arc::new(move || read_text(&path));
        Ok(Note::persisted(
            record.id,
            record.title,
            record.created_at,
            record.modified_at,
            loader,
        ))
    }
}

/// A missing body file reads as empty text.
fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(KuebikoError::Io(e)),
    }
}

/// Writes to a temp file in `dir`, then renames over `target`.
fn write_atomic(dir: &Path, target: &Path, content: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    fs::write(&tmp_path, content).map_err(KuebikoError::Io)?;
    fs::rename(&tmp_path, target).map_err(KuebikoError::Io)?;
    Ok(())
}

impl NoteStorage for FileNoteStore {
    fn required_parameters(&self) -> BTreeSet<DaoParameter> {
        BTreeSet::from([DaoParameter::Directory])
    }

    fn configure(&mut self, params: &DaoParams) -> Result<()> {
        let dir = params.get(DaoParameter::Directory).ok_or_else(|| {
            KuebikoError::Configuration("Parameter [directory] may not be null.".to_string())
        })?;
        self.root = Some(PathBuf::from(dir));

        if let Some(ext) = params.get(DaoParameter::FileExtension) {
            self.file_ext = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            };
        }
        Ok(())
    }

    fn find_by_id(&self, id: NoteId) -> Result<Option<Note>> {
        self.load_index()?
            .into_iter()
            .find(|r| r.id == id)
            .map(|r| self.to_note(r))
            .transpose()
    }

    fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        self.load_index()?
            .into_iter()
            .find(|r| r.title == title)
            .map(|r| self.to_note(r))
            .transpose()
    }

    fn list_notes(&self) -> Result<Vec<Note>> {
        self.load_index()?
            .into_iter()
            .map(|r| self.to_note(r))
            .collect()
    }

    fn persist_add(&mut self, note: Note) -> Result<Note> {
        let record = NoteRecord::from_note(&note)?;
        let mut index = self.load_index()?;
        if index.iter().any(|r| r.id == record.id) {
            return Err(KuebikoError::Store(format!(
                "Note id {} is already stored",
                record.id
            )));
        }

        // Body first so the index never points at a note without one.
        self.write_text(record.id, note.text()?)?;

        index.push(record);
        self.save_index(&mut index)?;
        Ok(note)
    }

    fn persist_update(&mut self, note: Note) -> Result<Note> {
        let record = NoteRecord::from_note(&note)?;
        let mut index = self.load_index()?;
        let Some(slot) = index.iter_mut().find(|r| r.id == record.id) else {
            return Err(KuebikoError::NoteNotFound(note.to_string()));
        };

        // An unloaded body was never edited.
        if let Some(text) = note.loaded_text() {
            self.write_text(record.id, text)?;
        }

        *slot = record;
        self.save_index(&mut index)?;
        Ok(note)
    }

    fn persist_delete(&mut self, note: &Note) -> Result<()> {
        let record = NoteRecord::from_note(note)?;
        let mut index = self.load_index()?;
        let before = index.len();
        index.retain(|r| r.id != record.id);
        if index.len() == before {
            return Err(KuebikoError::NoteNotFound(note.to_string()));
        }
        self.save_index(&mut index)?;

        let path = self.note_path(record.id)?;
        if path.exists() {
            fs::remove_file(path).map_err(KuebikoError::Io)?;
        }
        Ok(())
    }
}
