mod store;

use std::path::PathBuf;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::info;

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::session::Session;

pub use store::{AccountRecord, AccountStore, RemoteAccountStore};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration and login against the remote account table.
///
/// On success both operations persist the local config (last logged-in
/// identity) and hand back an explicit [`Session`] for the caller to thread
/// through provisioning and launch.
pub struct AccountService<S: AccountStore> {
    store: S,
    config_path: PathBuf,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, config_path: PathBuf) -> Self {
        Self { store, config_path }
    }

    pub async fn register(&self, username: &str, password: &str) -> LauncherResult<Session> {
        validate_credentials(username, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LauncherError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.store.find(username).await?.is_some() {
            return Err(LauncherError::AlreadyExists);
        }

        let record = AccountRecord {
            username: username.to_string(),
            password: hash_password(password)?,
        };
        self.store.insert(record).await?;

        self.remember(username)?;
        info!("Registered account {}", username);
        Ok(Session::for_user(username))
    }

    pub async fn login(&self, username: &str, password: &str) -> LauncherResult<Session> {
        validate_credentials(username, password)?;

        let Some(record) = self.store.find(username).await? else {
            return Err(LauncherError::InvalidCredentials);
        };
        if !verify_password(password, &record.password) {
            return Err(LauncherError::InvalidCredentials);
        }

        self.remember(username)?;
        info!("Logged in as {}", username);
        Ok(Session::for_user(username))
    }

    fn remember(&self, username: &str) -> LauncherResult<()> {
        LauncherConfig::now(username).save(&self.config_path)
    }
}

fn validate_credentials(username: &str, password: &str) -> LauncherResult<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(LauncherError::Validation(
            "Username and password are required".into(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> LauncherResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| LauncherError::AccountBackend(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::session::normalize_username;

    #[derive(Default)]
    struct MemoryAccountStore {
        rows: Mutex<HashMap<String, AccountRecord>>,
    }

    impl MemoryAccountStore {
        fn hash_for(&self, username: &str) -> String {
            self.rows.lock().unwrap()[username].password.clone()
        }
    }

    #[async_trait]
    impl AccountStore for MemoryAccountStore {
        async fn find(&self, username: &str) -> LauncherResult<Option<AccountRecord>> {
            Ok(self.rows.lock().unwrap().get(username).cloned())
        }

        async fn insert(&self, record: AccountRecord) -> LauncherResult<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(record.username.clone(), record);
            Ok(())
        }
    }

    fn service(dir: &tempfile::TempDir) -> AccountService<MemoryAccountStore> {
        AccountService::new(
            MemoryAccountStore::default(),
            dir.path().join("config.json"),
        )
    }

    #[tokio::test]
    async fn register_returns_derived_identity_and_persists_config() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = service(&dir);

        let session = accounts.register("Steve", "hunter22").await.unwrap();
        assert_eq!(session.uuid, normalize_username("Steve"));

        let config = LauncherConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.username, "Steve");
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = service(&dir);

        accounts.register("Steve", "hunter22").await.unwrap();
        let original_hash = accounts.store.hash_for("Steve");

        let err = accounts.register("Steve", "different7").await.unwrap_err();
        assert!(matches!(err, LauncherError::AlreadyExists));
        assert_eq!(accounts.store.hash_for("Steve"), original_hash);
    }

    #[tokio::test]
    async fn login_verifies_the_stored_hash() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = service(&dir);
        accounts.register("Steve", "hunter22").await.unwrap();

        let session = accounts.login("Steve", "hunter22").await.unwrap();
        assert_eq!(session.uuid, normalize_username("Steve"));

        let err = accounts.login("Steve", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, LauncherError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_and_bad_password_share_one_message() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = service(&dir);
        accounts.register("Steve", "hunter22").await.unwrap();

        let unknown = accounts.login("Nobody", "hunter22").await.unwrap_err();
        let wrong = accounts.login("Steve", "wrong-pass").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn validation_rejects_before_any_store_access() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = service(&dir);

        for (user, pass) in [("", "hunter22"), ("Steve", ""), ("   ", "hunter22")] {
            let err = accounts.login(user, pass).await.unwrap_err();
            assert!(matches!(err, LauncherError::Validation(_)));
        }

        let short = accounts.register("Steve", "abc").await.unwrap_err();
        assert!(matches!(short, LauncherError::Validation(_)));
        assert!(accounts.store.rows.lock().unwrap().is_empty());
    }
}
