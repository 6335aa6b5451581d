//! The vault: the only path between application state and persisted storage.
//!
//! Two artifacts are kept in the [`ArtifactStore`]:
//! - the verification token, an encrypted constant used to check a password without touching
//!   the (larger) state blob;
//! - the encrypted state.
//!
//! The vault holds no application state of its own. A successful [`Vault::unlock`] or
//! [`Vault::create_password`] returns a [`MasterSecret`] that later saves and loads need.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto;
use crate::models::AppState;
use crate::storage::{ArtifactStore, LEGACY_KEYS, STATE_KEY, VERIFICATION_KEY};
use crate::{Error, Result};

/// Plaintext of the verification token.
pub const VERIFICATION_LITERAL: &str = "questlog-vault-verification-v1";

/// What the vault needs before it can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultStatus {
    /// No password has been set (or legacy data was discarded)
    NeedsCreation,
    /// A password exists and must be supplied
    NeedsUnlock,
}

/// Capability to read and write the encrypted state.
///
/// Holds the password in memory only; keys are re-derived per operation with a fresh salt.
#[derive(Clone)]
pub struct MasterSecret {
    password: String,
}

impl MasterSecret {
    fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
        }
    }

    fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret(<redacted>)")
    }
}

/// Portable export of both encrypted artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub encrypted_state: String,
    pub verification_data: String,
}

impl Bundle {
    /// Parse a bundle file, requiring both fields as strings.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::CorruptBundle(format!("not JSON: {}", e)))?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::CorruptBundle("expected a JSON object".to_string()))?;
        let field = |name: &str| -> Result<String> {
            match obj.get(name) {
                Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
                Some(_) => Err(Error::CorruptBundle(format!("{} must be a string", name))),
                None => Err(Error::CorruptBundle(format!("missing {}", name))),
            }
        };
        Ok(Self {
            encrypted_state: field("encryptedState")?,
            verification_data: field("verificationData")?,
        })
    }
}

/// Password-derived encryption over an artifact store.
pub struct Vault {
    store: Box<dyn ArtifactStore>,
}

impl Vault {
    pub fn new(store: Box<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Where the artifacts live, for display.
    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Report whether a password must be created or supplied.
    ///
    /// Legacy pre-encryption data is discarded and forces creation.
    pub fn initialize(&mut self) -> Result<VaultStatus> {
        let mut legacy = false;
        for key in LEGACY_KEYS {
            legacy |= self.store.contains(key)?;
        }
        if legacy {
            tracing::info!(location = %self.location(), "discarding legacy unencrypted data");
            for key in LEGACY_KEYS.into_iter().chain([VERIFICATION_KEY, STATE_KEY]) {
                self.store.remove(key)?;
            }
            return Ok(VaultStatus::NeedsCreation);
        }
        if self.store.contains(VERIFICATION_KEY)? {
            Ok(VaultStatus::NeedsUnlock)
        } else {
            Ok(VaultStatus::NeedsCreation)
        }
    }

    /// Set the first password, persisting the verification token and an empty state.
    pub fn create_password(&mut self, password: &str) -> Result<MasterSecret> {
        if password.is_empty() {
            return Err(Error::InvalidInput("password must not be empty".to_string()));
        }
        if self.store.contains(VERIFICATION_KEY)? {
            return Err(Error::AlreadyInitialized);
        }
        let secret = MasterSecret::new(password);
        let token = crypto::encrypt_str(VERIFICATION_LITERAL, password)?;
        let state = seal(&secret, &AppState::default())?;
        self.store
            .put_all(&[(VERIFICATION_KEY, token.as_str()), (STATE_KEY, state.as_str())])?;
        tracing::info!(location = %self.location(), "vault created");
        Ok(secret)
    }

    /// Check `password` against the verification token only.
    pub fn unlock(&self, password: &str) -> Result<MasterSecret> {
        let token = self
            .store
            .get(VERIFICATION_KEY)?
            .ok_or(Error::MissingVerificationToken)?;
        let literal = crypto::decrypt_str(&token, password).map_err(|e| {
            if e.is_credential_failure() {
                Error::InvalidCredentials
            } else {
                e
            }
        })?;
        if literal != VERIFICATION_LITERAL {
            return Err(Error::InvalidCredentials);
        }
        tracing::debug!("vault unlocked");
        Ok(MasterSecret::new(password))
    }

    /// Decrypt the persisted state. `Value::Null` when nothing has been saved yet.
    pub fn load_state(&self, secret: &MasterSecret) -> Result<Value> {
        let Some(token) = self.store.get(STATE_KEY)? else {
            return Ok(Value::Null);
        };
        let json = crypto::decrypt_str(&token, secret.password())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Encrypt and overwrite the persisted state.
    pub fn save_state(&mut self, secret: &MasterSecret, state: &AppState) -> Result<()> {
        let sealed = seal(secret, state)?;
        self.store.put(STATE_KEY, &sealed)
    }

    /// Re-encrypt both artifacts under `new_password`.
    ///
    /// Both are re-encrypted before either is written, and they are written together.
    pub fn rotate_password(&mut self, old_password: &str, new_password: &str) -> Result<MasterSecret> {
        if new_password.is_empty() {
            return Err(Error::InvalidInput("new password must not be empty".to_string()));
        }
        self.unlock(old_password)?;
        let plaintext = match self.store.get(STATE_KEY)? {
            Some(token) => crypto::decrypt_str(&token, old_password)?,
            None => serde_json::to_string(&AppState::default())?,
        };

        let token = crypto::encrypt_str(VERIFICATION_LITERAL, new_password)?;
        let state = crypto::encrypt_str(&plaintext, new_password)?;
        self.store
            .put_all(&[(VERIFICATION_KEY, token.as_str()), (STATE_KEY, state.as_str())])?;
        tracing::info!("vault password rotated");
        Ok(MasterSecret::new(new_password))
    }

    /// Both encrypted artifacts as a portable bundle.
    pub fn export_bundle(&self) -> Result<Bundle> {
        let verification_data = self
            .store
            .get(VERIFICATION_KEY)?
            .ok_or(Error::NotInitialized)?;
        let encrypted_state = self.store.get(STATE_KEY)?.ok_or(Error::NotInitialized)?;
        Ok(Bundle {
            encrypted_state,
            verification_data,
        })
    }

    /// Replace both artifacts from a bundle file.
    ///
    /// The bundle is validated before anything is written. Any open session must re-unlock.
    pub fn import_bundle(&mut self, bytes: &[u8]) -> Result<()> {
        let bundle = Bundle::parse(bytes)?;
        self.store.put_all(&[
            (VERIFICATION_KEY, bundle.verification_data.as_str()),
            (STATE_KEY, bundle.encrypted_state.as_str()),
        ])?;
        for key in LEGACY_KEYS {
            self.store.remove(key)?;
        }
        tracing::info!(location = %self.location(), "bundle imported");
        Ok(())
    }
}

/// Serialize and encrypt a state. Session-only fields are skipped by serde.
fn seal(secret: &MasterSecret, state: &AppState) -> Result<String> {
    let json = serde_json::to_string(state)?;
    crypto::encrypt_str(&json, secret.password())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::{TestEnv, memory_vault};

    #[test]
    fn test_fresh_vault_needs_creation() {
        let mut vault = memory_vault();
        assert_eq!(vault.initialize().unwrap(), VaultStatus::NeedsCreation);
    }

    #[test]
    fn test_create_then_unlock() {
        let mut vault = memory_vault();
        vault.create_password("hunter2").unwrap();
        assert_eq!(vault.initialize().unwrap(), VaultStatus::NeedsUnlock);
        let secret = vault.unlock("hunter2").unwrap();
        let raw = vault.load_state(&secret).unwrap();
        assert_eq!(raw["agentName"], "Agent");
    }

    #[test]
    fn test_create_twice_rejected() {
        let mut vault = memory_vault();
        vault.create_password("a").unwrap();
        assert!(matches!(
            vault.create_password("b"),
            Err(Error::AlreadyInitialized)
        ));
        assert!(matches!(
            memory_vault().create_password(""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_password() {
        let mut vault = memory_vault();
        vault.create_password("right").unwrap();
        assert!(matches!(vault.unlock("wrong"), Err(Error::InvalidCredentials)));
    }

    #[test]
    fn test_missing_token_is_distinct() {
        let vault = memory_vault();
        assert!(matches!(
            vault.unlock("anything"),
            Err(Error::MissingVerificationToken)
        ));
    }

    #[test]
    fn test_corrupt_token_reads_as_credential_failure() {
        let mut store = MemoryStore::new();
        store.put(VERIFICATION_KEY, "garbage").unwrap();
        let vault = Vault::new(Box::new(store));
        let err = vault.unlock("pw").unwrap_err();
        assert!(err.is_credential_failure());
    }

    #[test]
    fn test_save_excludes_session_fields() {
        let store = MemoryStore::new();
        let mut vault = Vault::new(Box::new(store.clone()));
        let secret = vault.create_password("pw").unwrap();
        let state = AppState {
            is_command_palette_open: true,
            agent_name: "Nova".into(),
            ..Default::default()
        };
        let before = store.get(STATE_KEY).unwrap();
        vault.save_state(&secret, &state).unwrap();
        assert_ne!(store.get(STATE_KEY).unwrap(), before);
        let raw = vault.load_state(&secret).unwrap();
        assert_eq!(raw["agentName"], "Nova");
        assert!(raw.get("isCommandPaletteOpen").is_none());
    }

    #[test]
    fn test_legacy_data_forces_creation() {
        let mut store = MemoryStore::new();
        store.put("legacy-state", "{\"tasks\":[]}").unwrap();
        store.put(VERIFICATION_KEY, "stale").unwrap();
        let mut vault = Vault::new(Box::new(store.clone()));
        assert_eq!(vault.initialize().unwrap(), VaultStatus::NeedsCreation);
        assert!(store.is_empty());
        vault.create_password("pw").unwrap();
    }

    #[test]
    fn test_rotate_password() {
        let mut vault = memory_vault();
        let secret = vault.create_password("old").unwrap();
        let state = AppState {
            agent_name: "Rotated".into(),
            ..Default::default()
        };
        vault.save_state(&secret, &state).unwrap();

        let new_secret = vault.rotate_password("old", "new").unwrap();
        assert!(matches!(vault.unlock("old"), Err(Error::InvalidCredentials)));
        vault.unlock("new").unwrap();
        assert_eq!(vault.load_state(&new_secret).unwrap()["agentName"], "Rotated");
        assert!(vault.load_state(&secret).unwrap_err().is_credential_failure());
    }

    #[test]
    fn test_rotate_with_wrong_password_changes_nothing() {
        let store = MemoryStore::new();
        let mut vault = Vault::new(Box::new(store.clone()));
        vault.create_password("old").unwrap();
        let token = store.get(VERIFICATION_KEY).unwrap();
        assert!(vault.rotate_password("bad", "new").is_err());
        assert_eq!(store.get(VERIFICATION_KEY).unwrap(), token);
    }

    #[test]
    fn test_export_import_round_trip() {
        let env = TestEnv::new();
        let mut source = env.file_vault();
        let secret = source.create_password("pw").unwrap();
        let state = AppState {
            agent_name: "Exported".into(),
            ..Default::default()
        };
        source.save_state(&secret, &state).unwrap();
        let bundle = serde_json::to_vec(&source.export_bundle().unwrap()).unwrap();

        let mut target = memory_vault();
        target.import_bundle(&bundle).unwrap();
        let secret = target.unlock("pw").unwrap();
        assert_eq!(target.load_state(&secret).unwrap()["agentName"], "Exported");
    }

    #[test]
    fn test_import_rejects_incomplete_bundle_before_writing() {
        let store = MemoryStore::new();
        let mut vault = Vault::new(Box::new(store.clone()));
        vault.create_password("pw").unwrap();
        let token = store.get(VERIFICATION_KEY).unwrap();
        let bad_bundles: [&[u8]; 5] = [
            b"not json",
            br#"[]"#,
            br#"{"encryptedState": "abc"}"#,
            br#"{"verificationData": "abc"}"#,
            br#"{"encryptedState": 1, "verificationData": "abc"}"#,
        ];
        for bad in bad_bundles {
            assert!(matches!(vault.import_bundle(bad), Err(Error::CorruptBundle(_))));
        }
        assert_eq!(store.get(VERIFICATION_KEY).unwrap(), token);
    }

    #[test]
    fn test_export_requires_initialized_vault() {
        assert!(matches!(
            memory_vault().export_bundle(),
            Err(Error::NotInitialized)
        ));
    }
}
