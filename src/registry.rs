//! # Server registry and config persistence.
//!
//! The registry owns the map of named supervisors, loads and saves the
//! persisted server list (`manager.json`), and performs the single
//! process-wide shutdown sweep. It is a thin wrapper: all per-instance logic
//! lives in [`Supervisor`].
//!
//! ## Persistence rules
//! - A missing file yields the empty default list.
//! - A present but malformed file is fatal ([`RegistryError::Corrupt`]);
//!   the registry never silently falls back to defaults.
//! - [`Registry::save`] serializes compactly and skips the write when the
//!   bytes match what is already on disk, so re-saving an unmodified list is
//!   a no-op and byte-identical.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::core::Supervisor;
use crate::error::{RegistryError, SupervisorError};
use crate::subscribers::{LogWriter, Subscribe};

/// Persisted server list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub servers: Vec<ServerConfig>,
}

struct Inner {
    path: PathBuf,
    config: ManagerConfig,
    servers: RwLock<HashMap<String, Supervisor>>,
    /// Raw bytes currently on disk, for the idempotent-save comparison.
    persisted: Mutex<Option<String>>,
}

/// Registry of supervised server instances.
///
/// Cheap to clone; clones share the same instance map.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Loads the persisted server list from `path` and constructs one
    /// supervisor per entry, each with a [`LogWriter`] subscriber.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();

        let (config, persisted) = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let config = serde_json::from_str::<ManagerConfig>(&raw).map_err(|source| {
                    RegistryError::Corrupt {
                        path: path.clone(),
                        source,
                    }
                })?;
                (config, Some(raw))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (ManagerConfig::default(), None),
            Err(e) => return Err(e.into()),
        };

        Self::from_config(path, config, persisted)
    }

    fn from_config(
        path: PathBuf,
        config: ManagerConfig,
        persisted: Option<String>,
    ) -> Result<Self, RegistryError> {
        let mut servers = HashMap::new();
        for entry in &config.servers {
            if servers.contains_key(&entry.name) {
                warn!(server = %entry.name, "duplicate server entry ignored");
                continue;
            }
            let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
            servers.insert(
                entry.name.clone(),
                Supervisor::new(entry.clone(), subscribers),
            );
        }

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                config,
                servers: RwLock::new(servers),
                persisted: Mutex::new(persisted),
            }),
        })
    }

    /// Persists the server list. Skips the write when the serialized bytes
    /// equal what was last read or written.
    pub async fn save(&self) -> Result<(), RegistryError> {
        let raw = serde_json::to_string(&self.inner.config)
            .map_err(|source| RegistryError::Corrupt {
                path: self.inner.path.clone(),
                source,
            })?;

        let mut persisted = self.inner.persisted.lock().await;
        if persisted.as_deref() == Some(raw.as_str()) {
            return Ok(());
        }

        tokio::fs::write(&self.inner.path, &raw).await?;
        info!(path = %self.inner.path.display(), "server list saved");
        *persisted = Some(raw);
        Ok(())
    }

    /// Looks up an instance by name.
    pub async fn get(&self, name: &str) -> Option<Supervisor> {
        self.inner.servers.read().await.get(name).cloned()
    }

    /// All instances, sorted by name.
    pub async fn list(&self) -> Vec<Supervisor> {
        let servers = self.inner.servers.read().await;
        let mut all: Vec<Supervisor> = servers.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Starts every instance that is not already running. Each start runs in
    /// its own task; provisioning failures are logged, not propagated.
    pub async fn start_all(&self) {
        for sup in self.list().await {
            tokio::spawn(async move {
                match sup.start().await {
                    Ok(()) => {}
                    Err(SupervisorError::AlreadyRunning) => {
                        warn!(server = sup.name(), "already started");
                    }
                    Err(e) => {
                        error!(server = sup.name(), label = e.as_label(), error = %e, "start failed");
                    }
                }
            });
        }
    }

    /// The process-wide shutdown sweep: requests a graceful stop from every
    /// live instance exactly once.
    pub async fn stop_all(&self) {
        for sup in self.list().await {
            sup.stop().await;
        }
    }

    /// Waits until no instance is running, or until `grace` elapses.
    pub async fn wait_stopped(&self, grace: Duration) -> Result<(), RegistryError> {
        let deadline = Instant::now() + grace;
        loop {
            let mut stuck = Vec::new();
            for sup in self.list().await {
                if sup.is_running().await {
                    stuck.push(sup.name().to_string());
                }
            }
            if stuck.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RegistryError::GraceExceeded { grace, stuck });
            }
            time::sleep(Duration::from_millis(100)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_empty_registry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Registry::load(dir.path().join("manager.json"))
            .await
            .expect("load succeeds");
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manager.json");
        tokio::fs::write(&path, "{not json").await.expect("seed file");

        let err = Registry::load(&path).await.expect_err("load must fail");
        assert!(matches!(err, RegistryError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn entries_become_supervisors_with_defaults_filled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manager.json");
        tokio::fs::write(&path, r#"{"servers":[{"name":"lobby"},{}]}"#)
            .await
            .expect("seed file");

        let registry = Registry::load(&path).await.expect("load succeeds");
        let names: Vec<String> = registry
            .list()
            .await
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["lobby".to_string(), "server".to_string()]);

        let lobby = registry.get("lobby").await.expect("lobby exists");
        assert_eq!(lobby.version(), "latest");
        assert!(!lobby.is_running().await);
    }

    #[tokio::test]
    async fn resave_without_modification_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manager.json");
        tokio::fs::write(&path, r#"{"servers":[{"name":"lobby","version":"1.10.2"}]}"#)
            .await
            .expect("seed file");

        let registry = Registry::load(&path).await.expect("load succeeds");
        registry.save().await.expect("first save");
        let first = tokio::fs::read(&path).await.expect("read after save");

        registry.save().await.expect("second save");
        let second = tokio::fs::read(&path).await.expect("read after resave");
        assert_eq!(first, second);

        // A third save against the same bytes must not rewrite the file.
        let before = tokio::fs::metadata(&path).await.expect("metadata").modified();
        registry.save().await.expect("third save");
        let after = tokio::fs::metadata(&path).await.expect("metadata").modified();
        assert_eq!(before.ok(), after.ok());
    }

    #[tokio::test]
    async fn save_normalizes_defaults_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manager.json");
        tokio::fs::write(&path, r#"{"servers":[{"name":"lobby"}]}"#)
            .await
            .expect("seed file");

        let registry = Registry::load(&path).await.expect("load succeeds");
        registry.save().await.expect("save");

        let raw = tokio::fs::read_to_string(&path).await.expect("read");
        let reparsed: ManagerConfig = serde_json::from_str(&raw).expect("normalized parses");
        assert_eq!(reparsed.servers[0].name, "lobby");
        assert_eq!(reparsed.servers[0].options.jar, "minecraft_server.jar");
        // The normalized form is its own fixed point.
        assert_eq!(serde_json::to_string(&reparsed).expect("serialize"), raw);
    }

    #[tokio::test]
    async fn duplicate_names_keep_the_first_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manager.json");
        tokio::fs::write(
            &path,
            r#"{"servers":[{"name":"a","version":"1.9"},{"name":"a","version":"1.10"}]}"#,
        )
        .await
        .expect("seed file");

        let registry = Registry::load(&path).await.expect("load succeeds");
        assert_eq!(registry.list().await.len(), 1);
        let sup = registry.get("a").await.expect("entry exists");
        assert_eq!(sup.version(), "1.9");
    }
}
