//! Flat-file client registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use warden_api::{ClientConfig, ClientName};

use crate::{StoreError, StoreResult};

/// Registry of per-client desired state, persisted as one JSON file.
///
/// Mutations stamp `last_updated`, apply in memory, then save. A failed save
/// is logged and the mutation still counts; the next save writes the whole
/// registry again. Saves serialize on their own lock and replace the file
/// atomically (temp file + rename), so neither concurrent mutations nor a
/// crash leave a half-written registry behind.
pub struct ClientRegistry {
    path: Option<PathBuf>,
    clients: RwLock<HashMap<String, ClientConfig>>,
    save_lock: Mutex<()>,
}

impl ClientRegistry {
    /// Open or create a registry backed by `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let clients = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let clients: HashMap<String, ClientConfig> = serde_json::from_str(&raw)?;
            info!(
                clients = clients.len(),
                path = %path.display(),
                "Loaded client configurations"
            );
            clients
        } else {
            debug!(path = %path.display(), "No registry file yet, starting empty");
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            clients: RwLock::new(clients),
            save_lock: Mutex::new(()),
        })
    }

    /// Create a registry with no backing file (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            clients: RwLock::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }

    /// Fetch a client's config, registering it with defaults on first contact
    pub fn fetch_or_register(&self, name: &ClientName) -> ClientConfig {
        let (config, created) = {
            let mut clients = self.clients.write().unwrap();
            match clients.get(name.as_str()) {
                Some(config) => (config.clone(), false),
                None => {
                    let mut config = ClientConfig::default();
                    config.touch();
                    clients.insert(name.as_str().to_string(), config.clone());
                    (config, true)
                }
            }
        };

        if created {
            info!(client = %name, "Registered new client with locked defaults");
            self.save_or_log();
        }
        config
    }

    /// Set the unlock flag, creating the client if needed
    pub fn set_unlock(&self, name: &ClientName, unlock_allowed: bool) -> ClientConfig {
        self.update(name, |config| config.unlock_allowed = unlock_allowed)
    }

    /// Set the block-pass timer, creating the client if needed
    pub fn set_timer(&self, name: &ClientName, timer_seconds: i64) -> ClientConfig {
        self.update(name, |config| config.youtube_timer_seconds = timer_seconds)
    }

    fn update(&self, name: &ClientName, apply: impl FnOnce(&mut ClientConfig)) -> ClientConfig {
        let config = {
            let mut clients = self.clients.write().unwrap();
            let config = clients.entry(name.as_str().to_string()).or_default();
            apply(config);
            config.touch();
            config.clone()
        };
        self.save_or_log();
        config
    }

    /// Replace a client's whole config, stamping it as updated now
    pub fn upsert(&self, name: &ClientName, mut config: ClientConfig) -> ClientConfig {
        config.touch();
        {
            let mut clients = self.clients.write().unwrap();
            clients.insert(name.as_str().to_string(), config.clone());
        }
        self.save_or_log();
        config
    }

    /// Remove a client
    pub fn remove(&self, name: &ClientName) -> StoreResult<()> {
        {
            let mut clients = self.clients.write().unwrap();
            if clients.remove(name.as_str()).is_none() {
                return Err(StoreError::NotFound(name.to_string()));
            }
        }
        self.save_or_log();
        Ok(())
    }

    /// All clients, sorted by name for stable listings
    pub fn list(&self) -> Vec<(String, ClientConfig)> {
        let clients = self.clients.read().unwrap();
        let mut list: Vec<_> = clients
            .iter()
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    pub fn len(&self) -> usize {
        self.clients.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A mutation has already landed in memory by the time the save runs, so
    // a save failure must not unwind it.
    fn save_or_log(&self) {
        if let Err(e) = self.save() {
            error!(error = %e, "Failed to save client registry");
        }
    }

    /// Write the registry to its backing file
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // Saves share one temp path, so the write+rename pair must not
        // interleave with another save's.
        let _guard = self.save_lock.lock().unwrap();

        let snapshot = {
            let clients = self.clients.read().unwrap();
            serde_json::to_string_pretty(&*clients)?
        };

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, snapshot)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "Registry saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry_path(dir: &TempDir) -> PathBuf {
        dir.path().join("clients.json")
    }

    #[test]
    fn first_contact_registers_locked_defaults() {
        let dir = TempDir::new().unwrap();
        let registry = ClientRegistry::open(registry_path(&dir)).unwrap();

        let config = registry.fetch_or_register(&ClientName::new("desk-01"));
        assert!(!config.unlock_allowed);
        assert!(config.last_updated.is_some());
        assert_eq!(registry.len(), 1);

        // survives a restart
        let reopened = ClientRegistry::open(registry_path(&dir)).unwrap();
        assert_eq!(reopened.len(), 1);
        let config = reopened.fetch_or_register(&ClientName::new("desk-01"));
        assert!(!config.unlock_allowed);
    }

    #[test]
    fn reads_do_not_advance_last_updated() {
        let registry = ClientRegistry::in_memory();
        let name = ClientName::new("desk-01");

        let registered = registry.fetch_or_register(&name);
        let fetched = registry.fetch_or_register(&name);
        assert_eq!(registered, fetched);
    }

    #[test]
    fn setters_stamp_and_persist() {
        let dir = TempDir::new().unwrap();
        let registry = ClientRegistry::open(registry_path(&dir)).unwrap();
        let name = ClientName::new("desk-01");

        let config = registry.set_unlock(&name, true);
        assert!(config.unlock_allowed);
        assert!(config.last_updated.is_some());

        let config = registry.set_timer(&name, 600);
        assert_eq!(config.youtube_timer_seconds, 600);
        assert!(config.unlock_allowed);

        let reopened = ClientRegistry::open(registry_path(&dir)).unwrap();
        let config = reopened.fetch_or_register(&name);
        assert!(config.unlock_allowed);
        assert_eq!(config.youtube_timer_seconds, 600);
    }

    #[test]
    fn upsert_replaces_whole_config() {
        let registry = ClientRegistry::in_memory();
        let name = ClientName::new("desk-01");
        registry.set_timer(&name, 600);

        let config = registry.upsert(
            &name,
            ClientConfig {
                unlock_allowed: true,
                youtube_timer_seconds: 120,
                last_updated: None,
            },
        );
        assert!(config.unlock_allowed);
        assert_eq!(config.youtube_timer_seconds, 120);
        assert!(config.last_updated.is_some());
    }

    #[test]
    fn remove_unknown_client_is_not_found() {
        let registry = ClientRegistry::in_memory();
        let result = registry.remove(&ClientName::new("ghost"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        registry.fetch_or_register(&ClientName::new("desk-01"));
        registry.remove(&ClientName::new("desk-01")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let registry = ClientRegistry::in_memory();
        registry.fetch_or_register(&ClientName::new("zeta"));
        registry.fetch_or_register(&ClientName::new("alpha"));

        let names: Vec<_> = registry.list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn concurrent_mutations_never_publish_a_partial_file() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(ClientRegistry::open(registry_path(&dir)).unwrap());

        let mut writers = Vec::new();
        for thread in 0..4 {
            let registry = registry.clone();
            writers.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let name = ClientName::new(format!("desk-{thread}-{i}"));
                    registry.set_unlock(&name, i % 2 == 0);
                }
            }));
        }

        // every state of the file a reader can observe is a complete document
        let path = registry_path(&dir);
        let mut reads = 0;
        while writers.iter().any(|w| !w.is_finished()) {
            if let Ok(raw) = std::fs::read_to_string(&path) {
                serde_json::from_str::<HashMap<String, ClientConfig>>(&raw)
                    .expect("published registry file did not parse");
                reads += 1;
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }
        assert!(reads > 0);

        let reopened = ClientRegistry::open(&path).unwrap();
        assert_eq!(reopened.len(), 200);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let registry = ClientRegistry::open(registry_path(&dir)).unwrap();
        registry.set_unlock(&ClientName::new("desk-01"), true);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["clients.json"]);
    }

    #[test]
    fn failed_save_does_not_unwind_the_mutation() {
        // Parent directory never exists, so every save fails.
        let registry = ClientRegistry::open("/nonexistent-warden-test/clients.json").unwrap();

        let config = registry.set_unlock(&ClientName::new("desk-01"), true);
        assert!(config.unlock_allowed);
        assert!(registry.fetch_or_register(&ClientName::new("desk-01")).unlock_allowed);
        assert!(registry.save().is_err());
    }

    #[test]
    fn corrupt_registry_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = registry_path(&dir);
        std::fs::write(&path, "not json").unwrap();

        let result = ClientRegistry::open(&path);
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
