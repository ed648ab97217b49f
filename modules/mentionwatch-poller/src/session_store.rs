//! Keyed blob store for session tokens.
//!
//! Key = (account username, verification code), so rotating the second
//! factor invalidates the cache naturally. The backing medium is
//! pluggable; the default is one JSON file per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use chirper_client::SessionToken;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("no session saved for account {0}")]
    NotFound(String),

    #[error("session cache corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up the persisted credential for this account + factor.
    async fn load(
        &self,
        account: &str,
        verification_code: &str,
    ) -> Result<Vec<SessionToken>, SessionStoreError>;

    /// Persist the credential, overwriting any previous one.
    async fn save(
        &self,
        account: &str,
        verification_code: &str,
        tokens: &[SessionToken],
    ) -> Result<(), SessionStoreError>;
}

// ---------------------------------------------------------------------------
// FileSessionStore
// ---------------------------------------------------------------------------

/// One JSON file per (account, verification code) under `dir`. Saves
/// are write-temp-then-rename so a crash mid-write never leaves a
/// partial file that `load` can read.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, account: &str, verification_code: &str) -> PathBuf {
        self.dir.join(format!(
            "session_{}_{}.json",
            sanitize(account),
            sanitize(verification_code)
        ))
    }
}

/// Keep filenames safe regardless of what the account string contains.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(
        &self,
        account: &str,
        verification_code: &str,
    ) -> Result<Vec<SessionToken>, SessionStoreError> {
        let path = self.path_for(account, verification_code);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionStoreError::NotFound(account.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let tokens: Vec<SessionToken> = serde_json::from_slice(&bytes)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        debug!(path = %path.display(), count = tokens.len(), "Loaded session tokens");
        Ok(tokens)
    }

    async fn save(
        &self,
        account: &str,
        verification_code: &str,
        tokens: &[SessionToken],
    ) -> Result<(), SessionStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(account, verification_code);
        let tmp = path.with_extension("json.tmp");
        let bytes =
            serde_json::to_vec(tokens).map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), count = tokens.len(), "Saved session tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str) -> SessionToken {
        SessionToken {
            name: name.to_string(),
            value: "v".to_string(),
            domain: "chirper.example".to_string(),
            path: "/".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        let tokens = vec![token("auth"), token("csrf")];
        store.save("alice", "123456", &tokens).await.unwrap();

        let loaded = store.load("alice", "123456").await.unwrap();
        assert_eq!(loaded, tokens);
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        match store.load("alice", "123456").await {
            Err(SessionStoreError::NotFound(account)) => assert_eq!(account, "alice"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_corrupt_file_is_corrupt_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.save("alice", "123456", &[token("auth")]).await.unwrap();
        let path = store.path_for("alice", "123456");
        tokio::fs::write(&path, b"not json {{{").await.unwrap();

        match store.load("alice", "123456").await {
            Err(SessionStoreError::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_overwrites_previous_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.save("alice", "123456", &[token("old")]).await.unwrap();
        store.save("alice", "123456", &[token("new")]).await.unwrap();

        let loaded = store.load("alice", "123456").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "new");
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save("alice", "123456", &[token("auth")]).await.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["session_alice_123456.json"]);
    }

    #[tokio::test]
    async fn keys_are_isolated_per_account_and_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.save("alice", "111111", &[token("a")]).await.unwrap();
        store.save("alice", "222222", &[token("b")]).await.unwrap();

        assert_eq!(store.load("alice", "111111").await.unwrap()[0].name, "a");
        assert_eq!(store.load("alice", "222222").await.unwrap()[0].name, "b");
    }
}
