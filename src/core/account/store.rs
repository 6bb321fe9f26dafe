use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// One row of the remote `users` table. `password` holds the PHC hash
/// string, never the cleartext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: String,
    pub password: String,
}

/// Remote account table, queried by username equality. Records are created
/// on registration and read on login; they are never updated or deleted
/// from inside the launcher.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, username: &str) -> LauncherResult<Option<AccountRecord>>;
    async fn insert(&self, record: AccountRecord) -> LauncherResult<()>;
}

const DEFAULT_BASE_URL: &str = "https://accounts.nationcraft.net/rest/v1";
const DEFAULT_API_KEY: &str = "public-anon-key";
const BASE_URL_ENV: &str = "NATION_ACCOUNTS_URL";
const API_KEY_ENV: &str = "NATION_ACCOUNTS_KEY";

/// PostgREST-style account table client
/// (`GET /users?username=eq.<name>&select=*`, `POST /users`).
pub struct RemoteAccountStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteAccountStore {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env(client: Client) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
        Self::new(client, base_url, api_key)
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url.trim_end_matches('/'))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl AccountStore for RemoteAccountStore {
    async fn find(&self, username: &str) -> LauncherResult<Option<AccountRecord>> {
        let response = self
            .request(self.client.get(self.users_url()))
            .query(&[("username", format!("eq.{username}")), ("select", "*".into())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::AccountBackend(format!(
                "account table returned HTTP {status}"
            )));
        }

        let mut rows = response.json::<Vec<AccountRecord>>().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn insert(&self, record: AccountRecord) -> LauncherResult<()> {
        let response = self
            .request(self.client.post(self.users_url()))
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::AccountBackend(format!(
                "account insert returned HTTP {status}"
            )));
        }

        Ok(())
    }
}
