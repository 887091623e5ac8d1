use std::collections::BTreeMap;
use std::fmt;

/// A named configuration key a storage backend can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DaoParameter {
    /// Directory holding the note index and bodies.
    Directory,
    /// Extension for note body files (e.g. ".txt", ".md").
    FileExtension,
}

impl DaoParameter {
    pub const ALL: [DaoParameter; 2] = [DaoParameter::Directory, DaoParameter::FileExtension];

    pub fn key(self) -> &'static str {
        match self {
            DaoParameter::Directory => "directory",
            DaoParameter::FileExtension => "file_ext",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for DaoParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// String key/value configuration handed to `NoteDao::initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaoParams(BTreeMap<String, String>);

impl DaoParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, param: DaoParameter, value: impl Into<String>) -> Self {
        self.insert(param.key(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a typed parameter. Blank values count as absent.
    pub fn get(&self, param: DaoParameter) -> Option<&str> {
        self.0
            .get(param.key())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<BTreeMap<String, String>> for DaoParams {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for DaoParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for DaoParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}
