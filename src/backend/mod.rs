//! External text-to-SQL backend
//!
//! The backend executes queries, introspects metadata, answers chat messages
//! and keeps chat history. This crate only speaks its HTTP contract; the
//! [`Backend`] trait is the seam that lets tests run without a server.

mod http;
mod wire;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpBackend;
pub use wire::{Credentials, TableHint};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionTarget, DatabaseConnection};
use crate::error::Result;
use crate::session::{ChatSession, Message};

/// One result row: column name -> scalar, in backend column order
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(name: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnMetadata {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Body of a chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Message>,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatMetadata {
    pub tables: Vec<TableHint>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Liveness probe; any failure reads as "down"
    async fn health(&self) -> bool;

    /// Validate a connection descriptor against the real database
    async fn test_connection(&self, connection: &DatabaseConnection) -> Result<()>;

    /// Tables and their columns, in backend order
    async fn fetch_metadata(&self, target: &ConnectionTarget) -> Result<Vec<TableMetadata>>;

    /// Execute literal query text; an absent `data` field maps to an empty list
    async fn execute_query(&self, query: &str, target: &ConnectionTarget) -> Result<Vec<Row>>;

    /// Assistant reply text
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    async fn list_chats(&self) -> Result<Vec<ChatSession>>;

    async fn get_chat(&self, id: &str) -> Result<ChatSession>;

    /// Create or update
    async fn save_chat(&self, session: &ChatSession) -> Result<()>;

    async fn delete_chat(&self, id: &str) -> Result<()>;
}
