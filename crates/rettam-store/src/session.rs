//! Interactive session state
//!
//! One `Session` per user session: it owns the exploration store, the
//! selected exploration and the graph display toggles. Failed writes are
//! logged and the in-memory state stays authoritative until the next
//! successful save.

use std::path::PathBuf;

use rettam_core::{AnnotatedResult, Result, RettamError};
use rettam_graph::{build_graph, MetadataGraph};

use crate::{Exploration, ExplorationStore};

#[derive(Debug)]
pub struct Session {
    store: ExplorationStore,
    current: Option<String>,
    show_entities: bool,
    show_dependencies: bool,
}

impl Session {
    pub fn new(store: ExplorationStore) -> Self {
        let current = store.names().first().map(|name| name.to_string());
        Self {
            store,
            current,
            show_entities: true,
            show_dependencies: true,
        }
    }

    /// Open the store at `path`.
    ///
    /// An unreadable file is renamed to a `.bak` sibling before starting
    /// empty. If it cannot be moved either, the session runs detached and
    /// never writes over it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = match ExplorationStore::open(&path) {
            Ok(store) => store,
            Err(e) => match ExplorationStore::set_aside(&path) {
                Ok(backup) => {
                    tracing::warn!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Could not load explorations; moved the file aside and starting empty"
                    );
                    ExplorationStore::empty(path)
                }
                Err(move_error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        move_error = %move_error,
                        "Could not load explorations or move them aside; changes will not be saved"
                    );
                    ExplorationStore::detached(path)
                }
            },
        };
        Self::new(store)
    }

    pub fn store(&self) -> &ExplorationStore {
        &self.store
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&Exploration> {
        self.current.as_deref().and_then(|name| self.store.get(name))
    }

    pub fn show_entities(&self) -> bool {
        self.show_entities
    }

    pub fn show_dependencies(&self) -> bool {
        self.show_dependencies
    }

    pub fn set_show_entities(&mut self, show: bool) {
        self.show_entities = show;
    }

    pub fn set_show_dependencies(&mut self, show: bool) {
        self.show_dependencies = show;
    }

    /// Create an exploration (auto-named when `name` is `None`) and select it
    pub fn create_exploration(&mut self, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.store.next_name(),
        };
        tolerate_storage(self.store.create(&name))?;
        tracing::info!(exploration = %name, "Created exploration");
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.store.contains(name) {
            return Err(RettamError::NotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Delete an exploration; the selection falls back to the first one left
    pub fn delete(&mut self, name: &str) -> Result<()> {
        tolerate_storage(self.store.delete(name))?;
        tracing::info!(exploration = %name, "Deleted exploration");
        if self.current.as_deref() == Some(name) || self.current().is_none() {
            self.current = self.store.names().first().map(|n| n.to_string());
        }
        Ok(())
    }

    /// Delete the selected exploration, returning its name
    pub fn delete_current(&mut self) -> Result<Option<String>> {
        let Some(name) = self.current.clone() else {
            return Ok(None);
        };
        self.delete(&name)?;
        Ok(Some(name))
    }

    pub fn clear_all(&mut self) -> Result<()> {
        tolerate_storage(self.store.clear())?;
        tracing::info!("Cleared all explorations");
        self.current = None;
        Ok(())
    }

    /// Store processed text and metadata on the selected exploration
    pub fn record_processed(&mut self, text: &str, metadata: AnnotatedResult) -> Result<()> {
        let name = self
            .current
            .clone()
            .ok_or_else(|| RettamError::NotFound("no exploration selected".to_string()))?;
        tolerate_storage(self.store.update(&name, text, metadata))
    }

    /// Graph of the selected exploration under the current toggles, if it
    /// has been processed
    pub fn current_graph(&self) -> Option<MetadataGraph> {
        let metadata = self.current()?.metadata.as_ref()?;
        Some(build_graph(
            &metadata.extraction,
            self.show_entities,
            self.show_dependencies,
        ))
    }
}

/// Downgrade a failed write to a warning
fn tolerate_storage(result: Result<()>) -> Result<()> {
    match result {
        Err(RettamError::Storage { path, source }) => {
            tracing::warn!(
                path = %path.display(),
                error = %source,
                "Could not save explorations; changes kept in memory"
            );
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rettam_core::{Dependency, Entity, ExtractionResult};
    use tempfile::TempDir;

    fn processed() -> AnnotatedResult {
        AnnotatedResult::from(ExtractionResult {
            entities: vec![Entity {
                text: "Anna".to_string(),
                label: "PERSON".to_string(),
                start_offset: 0,
                end_offset: 4,
            }],
            dependencies: vec![Dependency {
                source_token: "sings".to_string(),
                target_token: "Anna".to_string(),
                relation: "nsubj".to_string(),
            }],
            ..Default::default()
        })
    }

    fn session_in(dir: &TempDir) -> Session {
        Session::open(dir.path().join("explorations.json"))
    }

    #[test]
    fn test_create_selects_and_names() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);

        assert_eq!(session.create_exploration(None).unwrap(), "Exploration 1");
        assert_eq!(session.create_exploration(None).unwrap(), "Exploration 2");
        assert_eq!(session.current_name(), Some("Exploration 2"));
        assert!(session.current().unwrap().text.is_empty());
    }

    #[test]
    fn test_graph_requires_processing() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_exploration(Some("song")).unwrap();
        assert!(session.current_graph().is_none());

        session.record_processed("Anna sings.", processed()).unwrap();
        let graph = session.current_graph().unwrap();
        assert_eq!(graph.node_count(), 3);

        session.set_show_dependencies(false);
        let graph = session.current_graph().unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_delete_falls_back_to_first() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_exploration(Some("a")).unwrap();
        session.create_exploration(Some("b")).unwrap();

        assert_eq!(session.delete_current().unwrap(), Some("b".to_string()));
        assert_eq!(session.current_name(), Some("a"));

        // Persisted: a new session over the same file does not list it
        let reopened = session_in(&dir);
        assert_eq!(reopened.store().names(), vec!["a"]);
        assert_eq!(reopened.current_name(), Some("a"));
    }

    #[test]
    fn test_clear_all() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_exploration(None).unwrap();
        session.clear_all().unwrap();

        assert!(session.current_name().is_none());
        assert!(session_in(&dir).store().is_empty());
    }

    #[test]
    fn test_record_without_selection() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        assert!(matches!(
            session.record_processed("text", processed()),
            Err(RettamError::NotFound(_))
        ));
        assert!(matches!(session.select("nope"), Err(RettamError::NotFound(_))));
    }

    #[test]
    fn test_unwritable_store_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::open(dir.path().join("no-such-dir/explorations.json"));

        let name = session.create_exploration(None).unwrap();
        session.record_processed("Anna sings.", processed()).unwrap();

        assert_eq!(session.current_name(), Some(name.as_str()));
        assert_eq!(session.current().unwrap().text, "Anna sings.");
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("explorations.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let session = Session::open(&path);
        assert!(session.store().is_empty());
        assert!(session.current_name().is_none());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("explorations.json.bak")).unwrap(),
            "[1, 2"
        );
    }

    #[test]
    fn test_bad_record_is_backed_up_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("explorations.json");
        let original = r#"{"Keep me": {"text": "Anna sings.", "metadata": null}, "Bad": {"text": 5, "metadata": null}}"#;
        std::fs::write(&path, original).unwrap();

        let mut session = Session::open(&path);
        assert!(!session.store().is_detached());
        session.create_exploration(None).unwrap();

        let backup = dir.path().join("explorations.json.bak");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(session_in(&dir).store().names(), vec!["Exploration 1"]);
    }
}
