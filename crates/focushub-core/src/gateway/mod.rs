//! Persistence gateway.
//!
//! Typed access to the four backend tables. Every operation checks first
//! whether a backend is configured and, if not, takes the offline branch
//! without any network I/O:
//!
//! | operation  | offline  | backend error |
//! |------------|----------|---------------|
//! | `get_all`  | `[]`     | `[]`          |
//! | `create`   | `None`   | `None`        |
//! | `update`   | `None`   | `None`        |
//! | `delete`   | `true`   | `false`       |
//!
//! Failures are logged and never returned to the caller.

mod client;

pub use client::BackendClient;

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BackendError;
use crate::settings::{Settings, SettingsPatch};
use crate::storage::Config;

/// A row kind stored in its own backend table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// `order` clause used by `get_all`.
    const ORDER: &'static str;
    /// Row cap for `get_all`.
    const LIMIT: Option<usize> = None;

    fn id(&self) -> Option<&str>;
}

/// Entry point to the backend. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    client: Option<BackendClient>,
}

impl Gateway {
    /// A gateway that never touches the network.
    pub fn offline() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: BackendClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Connect if the configuration names a usable backend, otherwise run offline.
    pub fn from_config(config: &Config) -> Self {
        match config.backend() {
            Some(endpoint) => {
                tracing::info!(url = %endpoint.url, "backend client initialized");
                Self::with_client(BackendClient::new(&endpoint))
            }
            None => {
                tracing::warn!("backend not configured, running in offline mode");
                Self::offline()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// The client, or `BackendError::Unavailable`.
    pub fn client(&self) -> Result<&BackendClient, BackendError> {
        self.client.as_ref().ok_or(BackendError::Unavailable)
    }

    pub fn table<T: Record>(&self) -> Table<'_, T> {
        Table {
            client: self.client.as_ref(),
            _record: PhantomData,
        }
    }

    pub fn tasks(&self) -> Table<'_, crate::task::Task> {
        self.table()
    }

    pub fn planned_tasks(&self) -> Table<'_, crate::plan::PlannedTask> {
        self.table()
    }

    pub fn focus_logs(&self) -> Table<'_, crate::history::LogEntry> {
        self.table()
    }

    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore {
            client: self.client.as_ref(),
        }
    }
}

/// Operations on one table.
pub struct Table<'a, T> {
    client: Option<&'a BackendClient>,
    _record: PhantomData<T>,
}

impl<T: Record> Table<'_, T> {
    fn offline(&self, operation: &str) {
        tracing::debug!(table = T::TABLE, operation, "backend offline, skipping");
    }

    fn failed(&self, operation: &str, error: &BackendError) {
        tracing::error!(table = T::TABLE, operation, error = %error, "backend operation failed");
    }

    /// All rows in table order; empty when offline or on failure.
    pub async fn get_all(&self) -> Vec<T> {
        let Some(client) = self.client else {
            self.offline("get_all");
            return Vec::new();
        };

        let mut query = vec![("order", T::ORDER.to_string())];
        if let Some(limit) = T::LIMIT {
            query.push(("limit", limit.to_string()));
        }

        match client.select(T::TABLE, &query).await {
            Ok(rows) => rows,
            Err(e) => {
                self.failed("get_all", &e);
                Vec::new()
            }
        }
    }

    /// Insert a row (without id); returns the stored row with its id.
    pub async fn create<N>(&self, row: &N) -> Option<T>
    where
        N: Serialize + Sync + ?Sized,
    {
        let Some(client) = self.client else {
            self.offline("create");
            return None;
        };
        match client.insert(T::TABLE, row).await {
            Ok(created) => {
                tracing::debug!(table = T::TABLE, "row created");
                Some(created)
            }
            Err(e) => {
                self.failed("create", &e);
                None
            }
        }
    }

    /// Apply a partial update; `updated_at` is stamped automatically.
    pub async fn update<P>(&self, id: &str, patch: &P) -> Option<T>
    where
        P: Serialize + Sync + ?Sized,
    {
        let Some(client) = self.client else {
            self.offline("update");
            return None;
        };
        let body = match stamped(patch) {
            Ok(body) => body,
            Err(e) => {
                self.failed("update", &e);
                return None;
            }
        };
        match client.update(T::TABLE, id, &body).await {
            Ok(updated) => Some(updated),
            Err(e) => {
                self.failed("update", &e);
                None
            }
        }
    }

    /// Delete by id. Offline counts as success so local removal proceeds.
    pub async fn delete(&self, id: &str) -> bool {
        let Some(client) = self.client else {
            self.offline("delete");
            return true;
        };
        match client.delete(T::TABLE, id).await {
            Ok(()) => true,
            Err(e) => {
                self.failed("delete", &e);
                false
            }
        }
    }
}

/// The single-row `user_settings` table.
pub struct SettingsStore<'a> {
    client: Option<&'a BackendClient>,
}

impl SettingsStore<'_> {
    const TABLE: &'static str = "user_settings";

    /// The settings row, or `None` when offline, missing or unreadable.
    pub async fn get(&self) -> Option<Settings> {
        let Some(client) = self.client else {
            tracing::debug!(table = Self::TABLE, "backend offline, skipping get");
            return None;
        };
        let query = [("limit", "1".to_string())];
        match client.select::<Settings>(Self::TABLE, &query).await {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                tracing::error!(table = Self::TABLE, error = %e, "failed to fetch settings");
                None
            }
        }
    }

    /// Update the existing row, or insert one if there is none yet.
    pub async fn upsert(&self, patch: &SettingsPatch) -> Option<Settings> {
        let Some(client) = self.client else {
            tracing::debug!(table = Self::TABLE, "backend offline, skipping upsert");
            return None;
        };

        let existing_id = self.get().await.and_then(|s| s.id);
        let result = match existing_id {
            Some(id) => match stamped(patch) {
                Ok(body) => client.update(Self::TABLE, &id, &body).await,
                Err(e) => Err(e),
            },
            None => client.insert(Self::TABLE, patch).await,
        };

        match result {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::error!(table = Self::TABLE, error = %e, "failed to save settings");
                None
            }
        }
    }
}

/// Serialize a patch and add an `updated_at` timestamp.
fn stamped<P: Serialize + ?Sized>(patch: &P) -> Result<serde_json::Value, BackendError> {
    let mut body = serde_json::to_value(patch).map_err(|e| BackendError::OperationFailed {
        table: String::new(),
        operation: "serialize".into(),
        message: e.to_string(),
    })?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert(
            "updated_at".into(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    Ok(body)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Accept both text (uuid) and integer primary keys.
pub fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional variant of [`de_id`].
pub fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, Task, TaskPatch};

    #[tokio::test]
    async fn offline_get_all_is_empty() {
        let gateway = Gateway::offline();
        assert!(!gateway.is_available());
        assert!(gateway.tasks().get_all().await.is_empty());
        assert!(gateway.planned_tasks().get_all().await.is_empty());
        assert!(gateway.focus_logs().get_all().await.is_empty());
    }

    #[tokio::test]
    async fn offline_writes_degrade() {
        let gateway = Gateway::offline();
        let task = crate::task::sample_tasks().remove(0);
        assert!(gateway.tasks().create(&NewTask::from(&task)).await.is_none());
        assert!(gateway
            .tasks()
            .update("1", &TaskPatch::default())
            .await
            .is_none());
        assert!(gateway.tasks().delete("1").await);
        assert!(gateway.settings().get().await.is_none());
        assert!(gateway
            .settings()
            .upsert(&SettingsPatch::focus_duration(30))
            .await
            .is_none());
    }

    #[test]
    fn offline_client_is_unavailable() {
        assert!(matches!(
            Gateway::offline().client(),
            Err(BackendError::Unavailable)
        ));
    }

    #[test]
    fn unconfigured_config_gives_offline_gateway() {
        assert!(!Gateway::from_config(&Config::default()).is_available());
    }

    #[test]
    fn stamped_adds_updated_at() {
        let body = stamped(&TaskPatch {
            checked: Some(true),
            ..TaskPatch::default()
        })
        .unwrap();
        assert_eq!(body["checked"], serde_json::Value::Bool(true));
        assert!(body["updated_at"].is_string());
    }

    #[test]
    fn ids_accept_text_and_integers() {
        let t: Task = serde_json::from_str(r#"{"id": "abc", "title": "x"}"#).unwrap();
        assert_eq!(t.id, "abc");
        let t: Task = serde_json::from_str(r#"{"id": 5, "title": "x"}"#).unwrap();
        assert_eq!(t.id, "5");
    }
}
