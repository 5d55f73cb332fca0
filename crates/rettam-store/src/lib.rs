//! rettam Store - Named explorations persisted as one JSON document
//!
//! The whole mapping is rewritten after every mutation. There is no
//! isolation between writers: a second process editing the same file
//! will lose updates. A crash mid-write can truncate the file.

use std::path::{Path, PathBuf};

use rettam_core::{AnnotatedResult, Result, RettamError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod session;

pub use session::Session;

/// One named analysis: the input text and its metadata once processed
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    pub name: String,
    pub text: String,
    pub metadata: Option<AnnotatedResult>,
}

impl Exploration {
    fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            metadata: None,
        }
    }
}

/// On-disk shape of an exploration; the name is the mapping key
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredExploration {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Option<AnnotatedResult>,
}

/// Insertion-ordered explorations backed by a JSON file
#[derive(Debug)]
pub struct ExplorationStore {
    path: PathBuf,
    explorations: Vec<Exploration>,
    detached: bool,
}

impl ExplorationStore {
    /// Empty store that will write to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            explorations: Vec::new(),
            detached: false,
        }
    }

    /// Empty store that refuses to write to `path`, for a file that could
    /// neither be loaded nor moved out of the way
    pub fn detached(path: impl Into<PathBuf>) -> Self {
        Self {
            detached: true,
            ..Self::empty(path)
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Rename an unreadable store file to the first free `<file>.bak`,
    /// `<file>.bak.1`, ... next to it and return the new path
    pub fn set_aside(path: &Path) -> Result<PathBuf> {
        let backup = backup_path(path);
        std::fs::rename(path, &backup).map_err(|source| RettamError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(backup)
    }

    /// Load the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No exploration file yet");
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(RettamError::Storage { path, source }),
        };

        let document: Map<String, Value> = serde_json::from_slice(&content)?;
        let mut explorations = Vec::with_capacity(document.len());
        for (name, value) in document {
            let stored: StoredExploration = serde_json::from_value(value)?;
            explorations.push(Exploration {
                name,
                text: stored.text,
                metadata: stored.metadata,
            });
        }

        tracing::debug!(
            path = %path.display(),
            explorations = explorations.len(),
            "Loaded explorations"
        );
        Ok(Self {
            path,
            explorations,
            detached: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.explorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.explorations.is_empty()
    }

    /// Names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.explorations.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exploration> {
        self.explorations.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Exploration> {
        self.explorations.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `"Exploration {n+1}"` for n stored explorations, bumped past any
    /// name already taken
    pub fn next_name(&self) -> String {
        let mut n = self.explorations.len() + 1;
        loop {
            let name = format!("Exploration {n}");
            if !self.contains(&name) {
                return name;
            }
            n += 1;
        }
    }

    // Mutations below apply in memory first. A failed write returns
    // `RettamError::Storage` with the in-memory change kept.

    /// Add an empty exploration
    pub fn create(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(RettamError::ExplorationExists(name.to_string()));
        }
        self.explorations.push(Exploration::empty(name));
        self.save()
    }

    /// Remove one exploration
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let position = self
            .explorations
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| RettamError::NotFound(name.to_string()))?;
        self.explorations.remove(position);
        self.save()
    }

    /// Remove every exploration
    pub fn clear(&mut self) -> Result<()> {
        self.explorations.clear();
        self.save()
    }

    /// Replace the text and metadata of an exploration
    pub fn update(&mut self, name: &str, text: &str, metadata: AnnotatedResult) -> Result<()> {
        let exploration = self
            .explorations
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| RettamError::NotFound(name.to_string()))?;
        exploration.text = text.to_string();
        exploration.metadata = Some(metadata);
        self.save()
    }

    /// Rewrite the whole file from memory
    pub fn save(&self) -> Result<()> {
        if self.detached {
            return Err(RettamError::Storage {
                path: self.path.clone(),
                source: std::io::Error::other("store is detached from an unreadable file"),
            });
        }

        #[derive(Serialize)]
        struct StoredRef<'a> {
            text: &'a str,
            metadata: Option<&'a AnnotatedResult>,
        }

        let mut document = Map::new();
        for exploration in &self.explorations {
            let stored = StoredRef {
                text: &exploration.text,
                metadata: exploration.metadata.as_ref(),
            };
            document.insert(exploration.name.clone(), serde_json::to_value(stored)?);
        }

        let bytes = serde_json::to_vec(&Value::Object(document))?;
        std::fs::write(&self.path, bytes).map_err(|source| RettamError::Storage {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            explorations = self.explorations.len(),
            "Saved explorations"
        );
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    let first = path.with_file_name(&name);
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| {
            let mut numbered = name.clone();
            numbered.push(format!(".{n}"));
            path.with_file_name(numbered)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
