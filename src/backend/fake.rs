//! In-process backend for tests; records every call it receives

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::{Backend, ChatRequest, Row, TableMetadata};
use crate::connection::{ConnectionTarget, DatabaseConnection};
use crate::error::{Error, Result};
use crate::session::ChatSession;

#[derive(Default)]
pub(crate) struct FakeState {
    pub down: bool,
    pub reject_connection: Option<String>,
    pub metadata: Vec<TableMetadata>,
    pub rows: Vec<Row>,
    pub query_error: Option<String>,
    pub reply: String,
    pub chat_error: Option<String>,
    pub fail_saves: bool,
    pub fail_deletes: bool,
    pub chats: Vec<ChatSession>,
    pub calls: Vec<String>,
    pub chat_requests: Vec<ChatRequest>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

fn server_error(message: &str) -> Error {
    Error::Server {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state().reply = "Here you go.".to_string();
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Calls whose name starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call.into());
        state
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn health(&self) -> bool {
        !self.record("health").down
    }

    async fn test_connection(&self, connection: &DatabaseConnection) -> Result<()> {
        let state = self.record(format!("test_connection {}", connection.name));
        match &state.reject_connection {
            Some(message) => Err(server_error(message)),
            None => Ok(()),
        }
    }

    async fn fetch_metadata(&self, _target: &ConnectionTarget) -> Result<Vec<TableMetadata>> {
        Ok(self.record("metadata").metadata.clone())
    }

    async fn execute_query(&self, query: &str, _target: &ConnectionTarget) -> Result<Vec<Row>> {
        let state = self.record(format!("query {}", query));
        match &state.query_error {
            Some(message) => Err(server_error(message)),
            None => Ok(state.rows.clone()),
        }
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let mut state = self.record("chat");
        state.chat_requests.push(request.clone());
        match &state.chat_error {
            Some(message) => Err(server_error(message)),
            None => Ok(state.reply.clone()),
        }
    }

    async fn list_chats(&self) -> Result<Vec<ChatSession>> {
        Ok(self.record("list_chats").chats.clone())
    }

    async fn get_chat(&self, id: &str) -> Result<ChatSession> {
        let state = self.record(format!("get_chat {}", id));
        state
            .chats
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::Server {
                status: 404,
                message: "Chat not found".to_string(),
            })
    }

    async fn save_chat(&self, session: &ChatSession) -> Result<()> {
        let mut state = self.record(format!("save_chat {}", session.id));
        if state.fail_saves {
            return Err(server_error("Failed to save chat"));
        }
        match state.chats.iter_mut().find(|c| c.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => state.chats.insert(0, session.clone()),
        }
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<()> {
        let mut state = self.record(format!("delete_chat {}", id));
        if state.fail_deletes {
            return Err(server_error("Failed to delete chat"));
        }
        state.chats.retain(|c| c.id != id);
        Ok(())
    }
}
