use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{
    error_message, parse_metadata, ChatResponse, Credentials, QueryRequest, QueryResponse,
    TestConnectionRequest,
};
use super::{Backend, ChatRequest, Row, TableMetadata};
use crate::config::BackendConfig;
use crate::connection::{ConnectionTarget, DatabaseConnection};
use crate::error::{Error, Result};
use crate::session::ChatSession;

/// Backend reached over HTTP at `{base_url}{api_prefix}/...`
///
/// No retries and no cancellation: every call is a single fire-and-await.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.endpoint_base(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `chats/{id}` with the id escaped as a single path segment
    fn chat_path(id: &str) -> String {
        format!("chats/{}", urlencoding::encode(id))
    }

    async fn post<B>(&self, path: &str, body: &B, fallback: &str) -> Result<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        check_status(response, fallback).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.post(path, body, fallback).await?;
        Ok(response.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        let response = check_status(response, fallback).await?;
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx response into [`Error::Server`], preferring the body's reason
async fn check_status(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| format!("{} (HTTP {})", fallback, status.as_u16()));
    warn!(status = status.as_u16(), %message, "backend request failed");
    Err(Error::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> bool {
        match self.client.get(self.url("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "health check failed");
                false
            }
        }
    }

    async fn test_connection(&self, connection: &DatabaseConnection) -> Result<()> {
        let body = TestConnectionRequest::from(connection);
        let fallback = format!(
            "Failed to connect to {} database. Please check your credentials and \
             ensure the database is accessible.",
            connection.kind().display_name()
        );
        self.post("test-connection", &body, &fallback).await?;
        Ok(())
    }

    async fn fetch_metadata(&self, target: &ConnectionTarget) -> Result<Vec<TableMetadata>> {
        let body = Credentials::from(target);
        let raw: serde_json::Value = self
            .post_json("metadata", &body, "Failed to fetch database metadata")
            .await?;
        Ok(parse_metadata(raw)?)
    }

    async fn execute_query(&self, query: &str, target: &ConnectionTarget) -> Result<Vec<Row>> {
        let body = QueryRequest {
            query,
            credentials: Credentials::from(target),
        };
        let response: QueryResponse = self
            .post_json("query", &body, "Failed to execute query")
            .await?;
        Ok(response.data.unwrap_or_default())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let response: ChatResponse = self
            .post_json("chat", request, "Failed to send message")
            .await?;
        Ok(response.response)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSession>> {
        self.get_json("chats", "Failed to load chat history").await
    }

    async fn get_chat(&self, id: &str) -> Result<ChatSession> {
        self.get_json(&Self::chat_path(id), "Failed to load chat")
            .await
    }

    async fn save_chat(&self, session: &ChatSession) -> Result<()> {
        self.post("chats", session, "Failed to save chat").await?;
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<()> {
        let url = self.url(&Self::chat_path(id));
        debug!(%url, "DELETE");
        let response = self.client.delete(&url).send().await?;
        check_status(response, "Failed to delete chat").await?;
        Ok(())
    }
}
