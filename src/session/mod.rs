//! Chat sessions and the controller that sends messages to the assistant
//!
//! The backend owns chat history. [`SessionStore`] keeps the loaded list in
//! memory, tracks which session is current and mirrors every change back
//! through [`Backend::save_chat`].

mod references;

pub use references::{extract_references, table_hints, TableReference};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{Backend, ChatMetadata, ChatRequest, TableMetadata};
use crate::error::{Error, Result};
use crate::title::{chat_title, DEFAULT_CHAT_TITLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_CHAT_TITLE.to_string()
}

// Older chats may carry `null` where a list or title is expected.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Message>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_title<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<Message>,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_title", deserialize_with = "null_as_default_title")]
    pub title: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
            title: default_title(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SessionStore {
    backend: Arc<dyn Backend>,
    sessions: Vec<ChatSession>,
    current: Option<String>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            sessions: Vec::new(),
            current: None,
        }
    }

    /// Fetch history; `preferred` becomes current when it is still listed
    ///
    /// Empty history yields one local "New Chat" session that is only
    /// saved once a message is sent.
    pub async fn load(&mut self, preferred: Option<&str>) -> Result<()> {
        let mut sessions = self.backend.list_chats().await?;
        if sessions.is_empty() {
            sessions.push(ChatSession::new());
        }

        let current = preferred
            .filter(|id| sessions.iter().any(|s| s.id == *id))
            .map(str::to_string)
            .unwrap_or_else(|| sessions[0].id.clone());

        debug!(count = sessions.len(), %current, "chat sessions loaded");
        self.sessions = sessions;
        self.current = Some(current);
        Ok(())
    }

    /// Re-list from the backend, keeping the current session when possible
    pub async fn refresh(&mut self) -> Result<()> {
        let current = self.current.clone();
        self.load(current.as_deref()).await
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&ChatSession> {
        self.current_id().and_then(|id| self.get(id))
    }

    fn session_mut(&mut self, id: &str) -> Result<&mut ChatSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found("Chat session", id))
    }

    /// Best-effort save; the local copy stays authoritative on failure
    async fn persist(&self, session: &ChatSession) {
        if let Err(e) = self.backend.save_chat(session).await {
            warn!(id = %session.id, error = %e, "failed to save chat session");
        }
    }

    /// Saved to the backend first, then inserted at the front and made current
    pub async fn create_session(&mut self) -> Result<&ChatSession> {
        let session = ChatSession::new();
        self.backend.save_chat(&session).await?;

        info!(id = %session.id, "chat session created");
        self.current = Some(session.id.clone());
        self.sessions.insert(0, session);
        Ok(&self.sessions[0])
    }

    /// Send `text` to the assistant and return its reply
    ///
    /// Blank text is ignored. The user message is appended before the
    /// request goes out and stays in the session if the request fails.
    pub async fn send_message(
        &mut self,
        session_id: &str,
        text: &str,
        metadata: &[TableMetadata],
    ) -> Result<Option<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let snapshot = {
            let session = self.session_mut(session_id)?;
            session.messages.push(Message::user(text));
            if session.messages.len() == 1 {
                session.title = chat_title(text);
            }
            session.clone()
        };
        self.persist(&snapshot).await;

        let references = extract_references(text);
        let request = ChatRequest {
            message: text.to_string(),
            history: snapshot.messages,
            metadata: ChatMetadata {
                tables: table_hints(&references, metadata),
            },
        };
        debug!(
            session = session_id,
            references = references.len(),
            "sending chat message"
        );
        let reply = self.backend.chat(&request).await?;

        let snapshot = {
            let session = self.session_mut(session_id)?;
            session.messages.push(Message::assistant(reply.clone()));
            session.clone()
        };
        self.persist(&snapshot).await;
        Ok(Some(reply))
    }

    /// Remove a session; the list never ends up empty
    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        self.backend.delete_chat(id).await?;
        self.sessions.retain(|s| s.id != id);
        info!(id, "chat session deleted");

        if self.sessions.is_empty() {
            let fresh = ChatSession::new();
            self.persist(&fresh).await;
            self.current = Some(fresh.id.clone());
            self.sessions.push(fresh);
        } else if self.current.as_deref() == Some(id) {
            self.current = Some(self.sessions[0].id.clone());
        }
        Ok(())
    }

    /// Make `id` current, reloading it from the backend unless it already is
    pub async fn switch_session(&mut self, id: &str) -> Result<&ChatSession> {
        if self.current.as_deref() != Some(id) {
            let session = self.backend.get_chat(id).await?;
            match self.sessions.iter_mut().find(|s| s.id == id) {
                Some(existing) => *existing = session,
                None => self.sessions.insert(0, session),
            }
            self.current = Some(id.to_string());
        }
        self.current()
            .ok_or_else(|| Error::not_found("Chat session", id))
    }
}
