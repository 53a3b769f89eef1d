//! Per-user preference stores.
//!
//! Every backend exposes the same [`PreferenceStore`] contract: absent users
//! read as the defaults, and `toggle` is a single load-modify-store under the
//! backend's own lock.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use estate_core::config::{EstateConfig, PreferenceBackend};
use estate_core::error::{EstateError, Result};
use estate_core::types::{PreferenceFlag, UserId, UserPreferences};

use crate::db::Database;
use crate::repository::SqlitePreferenceStore;

/// Keyed store of [`UserPreferences`].
pub trait PreferenceStore: Send + Sync {
    /// Preferences of `user`; defaults when the user has no record.
    fn get(&self, user: &UserId) -> Result<UserPreferences>;

    /// Replace the record of `user`.
    fn set(&self, user: &UserId, prefs: UserPreferences) -> Result<()>;

    /// Flip one flag and return its new value.
    fn toggle(&self, user: &UserId, flag: PreferenceFlag) -> Result<bool>;
}

/// Open the backend selected by `config.preferences`.
pub fn open_store(config: &EstateConfig) -> Result<Arc<dyn PreferenceStore>> {
    let path = config.data_path(&config.preferences.path);
    let store: Arc<dyn PreferenceStore> = match config.preferences.backend {
        PreferenceBackend::Json => Arc::new(JsonPreferenceStore::open(&path)?),
        PreferenceBackend::Sqlite => {
            Arc::new(SqlitePreferenceStore::new(Arc::new(Database::new(&path)?)))
        }
        PreferenceBackend::Memory => Arc::new(MemoryPreferenceStore::new()),
    };
    info!(backend = ?config.preferences.backend, path = %path.display(), "Preference store ready");
    Ok(store)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| EstateError::Storage(format!("Preference lock poisoned: {}", e)))
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    records: Mutex<HashMap<UserId, UserPreferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, user: &UserId) -> Result<UserPreferences> {
        Ok(lock(&self.records)?.get(user).copied().unwrap_or_default())
    }

    fn set(&self, user: &UserId, prefs: UserPreferences) -> Result<()> {
        lock(&self.records)?.insert(user.clone(), prefs);
        Ok(())
    }

    fn toggle(&self, user: &UserId, flag: PreferenceFlag) -> Result<bool> {
        let mut records = lock(&self.records)?;
        Ok(records.entry(user.clone()).or_default().toggle(flag))
    }
}

// =============================================================================
// JSON file
// =============================================================================

/// Flat JSON file `{"<user>": {"ai_mode": .., "voice_mode": ..}}`.
///
/// The file is read on every access and rewritten in full on every update,
/// through a uniquely named sibling temp file and a rename. The mutex serializes writers
/// inside this process.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonPreferenceStore {
    /// Open the store, creating the parent directory. A missing file is an
    /// empty store; a malformed one is an error.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            path: path.to_path_buf(),
            guard: Mutex::new(()),
        };
        let users = store.read_all()?.len();
        debug!(path = %path.display(), users, "JSON preference store opened");
        Ok(store)
    }

    fn read_all(&self) -> Result<BTreeMap<String, UserPreferences>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                EstateError::Storage(format!(
                    "malformed preference file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, records: &BTreeMap<String, UserPreferences>) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, user: &UserId) -> Result<UserPreferences> {
        let _guard = lock(&self.guard)?;
        Ok(self.read_all()?.get(&user.0).copied().unwrap_or_default())
    }

    fn set(&self, user: &UserId, prefs: UserPreferences) -> Result<()> {
        let _guard = lock(&self.guard)?;
        let mut records = self.read_all()?;
        records.insert(user.0.clone(), prefs);
        self.write_all(&records)
    }

    fn toggle(&self, user: &UserId, flag: PreferenceFlag) -> Result<bool> {
        let _guard = lock(&self.guard)?;
        let mut records = self.read_all()?;
        let value = records.entry(user.0.clone()).or_default().toggle(flag);
        self.write_all(&records)?;
        debug!(user = %user, flag = flag.key(), value, "Preference toggled");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn PreferenceStore) {
        let user = UserId::from("42");
        assert_eq!(store.get(&user).unwrap(), UserPreferences::default());

        assert!(store.toggle(&user, PreferenceFlag::AiMode).unwrap());
        assert!(store.get(&user).unwrap().ai_mode);
        assert!(!store.get(&user).unwrap().voice_mode);

        assert!(!store.toggle(&user, PreferenceFlag::AiMode).unwrap());
        assert_eq!(store.get(&user).unwrap(), UserPreferences::default());

        store
            .set(
                &user,
                UserPreferences {
                    ai_mode: false,
                    voice_mode: true,
                },
            )
            .unwrap();
        assert!(store.get(&user).unwrap().voice_mode);
        assert!(!store.get(&UserId::from("7")).unwrap().voice_mode);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryPreferenceStore::new());
    }

    #[test]
    fn test_json_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&JsonPreferenceStore::open(&dir.path().join("prefs.json")).unwrap());
    }

    #[test]
    fn test_json_store_persists_flat_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        {
            let store = JsonPreferenceStore::open(&path).unwrap();
            store
                .toggle(&UserId::from(100_i64), PreferenceFlag::VoiceMode)
                .unwrap();
        }
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["100"]["voice_mode"], serde_json::Value::Bool(true));
        assert_eq!(raw["100"]["ai_mode"], serde_json::Value::Bool(false));

        let reopened = JsonPreferenceStore::open(&path).unwrap();
        assert!(reopened.get(&UserId::from("100")).unwrap().voice_mode);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_store_reads_partial_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"5": {"ai_mode": true}}"#).unwrap();
        let store = JsonPreferenceStore::open(&path).unwrap();
        let prefs = store.get(&UserId::from("5")).unwrap();
        assert!(prefs.ai_mode);
        assert!(!prefs.voice_mode);
    }

    #[test]
    fn test_json_store_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonPreferenceStore::open(&path).unwrap_err();
        assert!(matches!(err, EstateError::Storage(_)));
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonPreferenceStore::open(&dir.path().join("p.json")).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .toggle(&UserId::from(i as i64), PreferenceFlag::AiMode)
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        for i in 0..8_i64 {
            assert!(store.get(&UserId::from(i)).unwrap().ai_mode);
        }
    }

    #[test]
    fn test_json_stores_sharing_a_file_write_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        let handles: Vec<_> = (0..2_i64)
            .map(|n| {
                let store = JsonPreferenceStore::open(&path).unwrap();
                std::thread::spawn(move || {
                    for i in 0..25_i64 {
                        store
                            .toggle(&UserId::from(n * 100 + i), PreferenceFlag::VoiceMode)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let reopened = JsonPreferenceStore::open(&path).unwrap();
        assert!(!reopened.read_all().unwrap().is_empty());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("user_settings.json")]);
    }

    #[test]
    fn test_open_store_selects_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EstateConfig::default();
        config.general.data_dir = dir.path().to_string_lossy().into_owned();

        config.preferences.backend = PreferenceBackend::Memory;
        exercise(open_store(&config).unwrap().as_ref());

        config.preferences.backend = PreferenceBackend::Json;
        exercise(open_store(&config).unwrap().as_ref());
        assert!(dir.path().join("user_settings.json").exists());

        config.preferences.backend = PreferenceBackend::Sqlite;
        config.preferences.path = "prefs.db".to_string();
        exercise(open_store(&config).unwrap().as_ref());
        assert!(dir.path().join("prefs.db").exists());
    }
}
