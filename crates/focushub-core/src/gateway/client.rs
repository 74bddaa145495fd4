//! BackendClient: PostgREST-style row operations over HTTP.
//!
//! The hosted backend exposes each table at `{base}/rest/v1/{table}`. Filters
//! go in the query string (`id=eq.42`), writes ask for the affected rows back
//! with `Prefer: return=representation`.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::BackendError;
use crate::storage::BackendEndpoint;

const REST_PREFIX: &str = "rest/v1/";

/// Authenticated client for one backend project.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    anon_key: String,
    http: Client,
}

impl BackendClient {
    /// Create a client for a validated endpoint.
    pub fn new(endpoint: &BackendEndpoint) -> Self {
        Self {
            base: endpoint.url.clone(),
            anon_key: endpoint.anon_key.clone(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        self.base
            .join(REST_PREFIX)
            .and_then(|rest| rest.join(table))
            .map_err(|e| BackendError::OperationFailed {
                table: table.to_string(),
                operation: "resolve".into(),
                message: e.to_string(),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// `GET /{table}?select=*&...`
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let request = self
            .authorized(self.http.get(self.table_url(table)?))
            .query(&[("select", "*")])
            .query(query);
        let resp = check(table, "select", request.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// `POST /{table}` with a single row; returns the stored row.
    pub async fn insert<B, T>(&self, table: &str, row: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .authorized(self.http.post(self.table_url(table)?))
            .header("Prefer", "return=representation")
            .json(&[row]);
        let resp = check(table, "insert", request.send().await?).await?;
        first_row(resp).await
    }

    /// `PATCH /{table}?id=eq.{id}`; returns the updated row.
    pub async fn update<B, T>(&self, table: &str, id: &str, patch: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .authorized(self.http.patch(self.table_url(table)?))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch);
        let resp = check(table, "update", request.send().await?).await?;
        first_row(resp).await
    }

    /// `DELETE /{table}?id=eq.{id}`
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let request = self
            .authorized(self.http.delete(self.table_url(table)?))
            .query(&[("id", format!("eq.{id}"))]);
        check(table, "delete", request.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success response into an error, preferring the backend's own
/// error message when the body carries one.
async fn check(table: &str, operation: &str, resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    match message {
        Some(message) => Err(BackendError::OperationFailed {
            table: table.to_string(),
            operation: operation.to_string(),
            message,
        }),
        None => Err(BackendError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

async fn first_row<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    let rows: Vec<T> = resp.json().await?;
    rows.into_iter().next().ok_or(BackendError::EmptyResponse)
}
