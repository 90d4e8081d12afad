use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{IdentityKind, Profile};

/// Keychain service name; each identity kind is one account under it
const SERVICE_NAME: &str = "jobgate";

/// Credentials file name in cache directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// What one credential slot holds: the bearer token plus a minimal
/// snapshot of the profile it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
    pub stored_at: DateTime<Utc>,
}

impl StoredCredential {
    pub fn new<P: Profile>(token: impl Into<String>, profile: &P) -> Self {
        Self {
            token: token.into(),
            // A profile that fails to serialize is just left out of the snapshot
            profile: serde_json::to_value(profile).ok(),
            stored_at: Utc::now(),
        }
    }

    /// A slot holding only a token, e.g. written by an older client
    pub fn token_only(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            profile: None,
            stored_at: Utc::now(),
        }
    }

    /// Decode the profile snapshot, if there is one and it matches `P`
    pub fn profile_snapshot<P: Profile>(&self) -> Option<P> {
        self.profile
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Persisted key/value storage with exactly one slot per identity kind.
///
/// Reads are synchronous so the slot is available immediately at startup.
pub trait CredentialStore: Send + Sync {
    fn get(&self, kind: IdentityKind) -> Result<Option<StoredCredential>>;

    /// Overwrite the slot for `kind`. Other kinds' slots are untouched.
    fn set(&self, kind: IdentityKind, credential: &StoredCredential) -> Result<()>;

    /// Empty the slot for `kind`. Clearing an empty slot succeeds.
    fn clear(&self, kind: IdentityKind) -> Result<()>;

    fn has_token(&self, kind: IdentityKind) -> bool {
        matches!(self.get(kind), Ok(Some(_)))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slots: Mutex<HashMap<IdentityKind, StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a slot already filled, as if left over from a previous run
    pub fn with_credential(kind: IdentityKind, credential: StoredCredential) -> Self {
        let store = Self::new();
        if let Ok(mut slots) = store.slots.lock() {
            slots.insert(kind, credential);
        }
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, kind: IdentityKind) -> Result<Option<StoredCredential>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("credential store lock poisoned"))?;
        Ok(slots.get(&kind).cloned())
    }

    fn set(&self, kind: IdentityKind, credential: &StoredCredential) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("credential store lock poisoned"))?;
        slots.insert(kind, credential.clone());
        Ok(())
    }

    fn clear(&self, kind: IdentityKind) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("credential store lock poisoned"))?;
        slots.remove(&kind);
        Ok(())
    }
}

// ============================================================================
// OS keychain store
// ============================================================================

/// Stores each slot as one OS keychain entry.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, kind: IdentityKind) -> Result<Entry> {
        Entry::new(&self.service, kind.slot_name()).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, kind: IdentityKind) -> Result<Option<StoredCredential>> {
        let entry = self.entry(kind)?;
        match entry.get_password() {
            Ok(secret) => {
                let credential = serde_json::from_str(&secret)
                    .context("Failed to parse credential from keychain")?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credential from keychain"),
        }
    }

    fn set(&self, kind: IdentityKind, credential: &StoredCredential) -> Result<()> {
        let secret = serde_json::to_string(credential)?;
        self.entry(kind)?
            .set_password(&secret)
            .context("Failed to store credential in keychain")?;
        debug!(%kind, "Credential stored in keychain");
        Ok(())
    }

    fn clear(&self, kind: IdentityKind) -> Result<()> {
        match self.entry(kind)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

// ============================================================================
// File store
// ============================================================================

/// Stores both slots in one JSON file in the cache directory.
pub struct FileCredentialStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write of the shared file
    lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    slots: HashMap<IdentityKind, StoredCredential>,
}

impl FileCredentialStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    fn credentials_path(&self) -> PathBuf {
        self.cache_dir.join(CREDENTIALS_FILE)
    }

    fn read_file(&self) -> Result<CredentialFile> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(CredentialFile::default());
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read credentials file")?;
        serde_json::from_str(&contents).context("Failed to parse credentials file")
    }

    fn write_file(&self, file: &CredentialFile) -> Result<()> {
        let path = self.credentials_path();
        if file.slots.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove credentials file")?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;
        let contents = serde_json::to_string_pretty(file)?;

        // Temp file in the same directory, renamed over the old one, so a
        // crash mid-write never leaves a torn file behind
        let mut temp = NamedTempFile::new_in(&self.cache_dir)
            .context("Failed to create temp credentials file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credentials file permissions")?;
        }
        temp.write_all(contents.as_bytes())
            .context("Failed to write credentials file")?;
        temp.persist(&path)
            .context("Failed to replace credentials file")?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialFile),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("credential file lock poisoned"))?;
        // An unreadable file holds nothing recoverable; start over rather
        // than failing every later login and logout
        let mut file = self.read_file().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable credentials file");
            CredentialFile::default()
        });
        f(&mut file);
        self.write_file(&file)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, kind: IdentityKind) -> Result<Option<StoredCredential>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("credential file lock poisoned"))?;
        Ok(self.read_file()?.slots.remove(&kind))
    }

    fn set(&self, kind: IdentityKind, credential: &StoredCredential) -> Result<()> {
        self.update(|file| {
            file.slots.insert(kind, credential.clone());
        })
    }

    fn clear(&self, kind: IdentityKind) -> Result<()> {
        self.update(|file| {
            file.slots.remove(&kind);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{UserProfile, UserRole};

    fn temp_cache_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "jobgate-test-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn seeker() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Sam Seeker".to_string(),
            email: "sam@example.test".to_string(),
            role: UserRole::JobSeeker,
        }
    }

    #[test]
    fn test_memory_store_slots_are_independent() {
        let store = MemoryCredentialStore::new();
        store
            .set(IdentityKind::User, &StoredCredential::token_only("user-token"))
            .unwrap();
        store
            .set(IdentityKind::Company, &StoredCredential::token_only("company-token"))
            .unwrap();

        store.clear(IdentityKind::Company).unwrap();

        assert_eq!(store.get(IdentityKind::User).unwrap().unwrap().token, "user-token");
        assert!(store.get(IdentityKind::Company).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_set_overwrites_same_kind_only() {
        let store = MemoryCredentialStore::new();
        store.set(IdentityKind::User, &StoredCredential::token_only("old")).unwrap();
        store.set(IdentityKind::User, &StoredCredential::token_only("new")).unwrap();
        assert_eq!(store.get(IdentityKind::User).unwrap().unwrap().token, "new");
        assert!(!store.has_token(IdentityKind::Company));
    }

    #[test]
    fn test_clear_empty_slot_succeeds() {
        let store = MemoryCredentialStore::new();
        assert!(store.clear(IdentityKind::User).is_ok());
        assert!(store.clear(IdentityKind::User).is_ok());
    }

    #[test]
    fn test_profile_snapshot_round_trip() {
        let credential = StoredCredential::new("t", &seeker());
        assert_eq!(credential.profile_snapshot::<UserProfile>(), Some(seeker()));
        assert_eq!(StoredCredential::token_only("t").profile_snapshot::<UserProfile>(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = temp_cache_dir("file-persist");

        let store = FileCredentialStore::new(dir.clone());
        store
            .set(IdentityKind::User, &StoredCredential::new("user-token", &seeker()))
            .unwrap();
        store
            .set(IdentityKind::Company, &StoredCredential::token_only("company-token"))
            .unwrap();

        let reopened = FileCredentialStore::new(dir.clone());
        let user = reopened.get(IdentityKind::User).unwrap().unwrap();
        assert_eq!(user.token, "user-token");
        assert_eq!(user.profile_snapshot::<UserProfile>(), Some(seeker()));

        reopened.clear(IdentityKind::User).unwrap();
        assert!(store.get(IdentityKind::User).unwrap().is_none());
        assert_eq!(
            store.get(IdentityKind::Company).unwrap().unwrap().token,
            "company-token"
        );

        reopened.clear(IdentityKind::Company).unwrap();
        assert!(!dir.join(CREDENTIALS_FILE).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[ignore = "needs an unlocked OS keychain"]
    fn test_keyring_store_persists_across_instances() {
        let service = format!("jobgate-test-{}", std::process::id());
        let store = KeyringCredentialStore::with_service(service.clone());
        store
            .set(IdentityKind::User, &StoredCredential::token_only("kept"))
            .unwrap();

        // A fresh store sees the same entry, so the slot survives a restart
        let reopened = KeyringCredentialStore::with_service(service);
        assert_eq!(reopened.get(IdentityKind::User).unwrap().unwrap().token, "kept");
        assert!(reopened.get(IdentityKind::Company).unwrap().is_none());

        reopened.clear(IdentityKind::User).unwrap();
        assert!(store.get(IdentityKind::User).unwrap().is_none());
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let dir = temp_cache_dir("file-corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CREDENTIALS_FILE), "{not json").unwrap();

        let store = FileCredentialStore::new(dir.clone());
        assert!(store.get(IdentityKind::User).is_err());

        // Writes replace the unreadable file instead of failing forever
        store
            .set(IdentityKind::User, &StoredCredential::token_only("fresh"))
            .unwrap();
        assert_eq!(store.get(IdentityKind::User).unwrap().unwrap().token, "fresh");

        std::fs::write(dir.join(CREDENTIALS_FILE), "{not json").unwrap();
        store.clear(IdentityKind::Company).unwrap();
        assert!(store.get(IdentityKind::User).unwrap().is_none());
        assert!(!dir.join(CREDENTIALS_FILE).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_cache_dir("file-mode");
        let store = FileCredentialStore::new(dir.clone());
        store
            .set(IdentityKind::Company, &StoredCredential::token_only("secret"))
            .unwrap();

        let mode = std::fs::metadata(dir.join(CREDENTIALS_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);

        let leftovers = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(leftovers, 1, "temp file left next to credentials.json");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
