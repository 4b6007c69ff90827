//! Application state
//!
//! One explicit object owns the store, the backend and every component.
//! The CLI builds it once per invocation; tests build it over a
//! [`MemoryStore`](crate::store::MemoryStore) and a fake backend.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::backend::{Backend, HttpBackend, TableMetadata};
use crate::config::Config;
use crate::connection::{ConnectionRegistry, DatabaseConnection, NewConnection};
use crate::error::{Error, Result};
use crate::query::{Query, QueryTabs};
use crate::session::{ChatSession, SessionStore};
use crate::store::{keys, load_json, save_json, KeyValueStore, SqliteStore};

pub struct App {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn Backend>,
    connections: ConnectionRegistry,
    sessions: SessionStore,
    queries: QueryTabs,
    account: Account,
    metadata: Vec<TableMetadata>,
}

impl App {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn Backend>,
        persist_queries: bool,
    ) -> Self {
        Self {
            connections: ConnectionRegistry::new(store.clone()),
            sessions: SessionStore::new(backend.clone()),
            queries: QueryTabs::new(store.clone(), persist_queries),
            account: Account::new(store.clone()),
            metadata: Vec::new(),
            store,
            backend,
        }
    }

    /// SQLite store at the configured path plus the HTTP backend
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.storage_path();
        debug!(path = %path.display(), "opening store");
        let store = Arc::new(SqliteStore::open(&path)?);
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        Ok(Self::new(store, backend, config.queries.persist))
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn queries(&self) -> &QueryTabs {
        &self.queries
    }

    pub fn queries_mut(&mut self) -> &mut QueryTabs {
        &mut self.queries
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Tables of the selected connection, as last fetched
    pub fn metadata(&self) -> &[TableMetadata] {
        &self.metadata
    }

    pub async fn backend_healthy(&self) -> bool {
        self.backend.health().await
    }

    /// Validate locally, probe the backend, test the credentials, then store
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn connect(&mut self, draft: NewConnection) -> Result<DatabaseConnection> {
        draft.validate()?;
        if self.connections.is_duplicate(&draft, None) {
            return Err(Error::DuplicateConnection);
        }

        if !self.backend.health().await {
            return Err(Error::BackendUnavailable);
        }

        let candidate = DatabaseConnection {
            id: String::new(),
            name: draft.name.trim().to_string(),
            last_used: None,
            target: draft.target.clone(),
        };
        self.backend.test_connection(&candidate).await?;

        self.connections.add_connection(draft)
    }

    /// Persist the selection and replace the metadata with the new tables
    pub async fn select_connection(&mut self, id_or_name: &str) -> Result<&[TableMetadata]> {
        let conn = self
            .connections
            .find(id_or_name)
            .ok_or_else(|| Error::not_found("Connection", id_or_name))?;
        self.connections.select(&conn.id)?;
        self.metadata.clear();
        self.load_metadata(&conn).await
    }

    /// Re-fetch tables for the selected connection
    pub async fn refresh_metadata(&mut self) -> Result<&[TableMetadata]> {
        let conn = self
            .connections
            .selected()
            .ok_or_else(|| Error::validation("No database selected"))?;
        self.load_metadata(&conn).await
    }

    async fn load_metadata(&mut self, conn: &DatabaseConnection) -> Result<&[TableMetadata]> {
        self.metadata = self.backend.fetch_metadata(&conn.target).await?;
        info!(connection = %conn.name, tables = self.metadata.len(), "metadata loaded");
        Ok(&self.metadata)
    }

    /// Run against the selected connection
    pub async fn run_query(&mut self, text: &str) -> Result<&Query> {
        let conn = self.connections.selected();
        let result = self
            .queries
            .run_query(self.backend.as_ref(), text, conn.as_ref())
            .await;
        if let (Ok(_), Some(conn)) = (&result, &conn) {
            if let Err(e) = self.connections.mark_used(&conn.id) {
                warn!(error = %e, "failed to update last used");
            }
        }
        result
    }

    fn remember_current_chat(&self) -> Result<()> {
        match self.sessions.current_id() {
            Some(id) => save_json(self.store.as_ref(), keys::CURRENT_CHAT, id),
            None => self.store.remove(keys::CURRENT_CHAT),
        }
    }

    /// Load chat history, restoring the remembered current session
    pub async fn load_chats(&mut self) -> Result<()> {
        let preferred: Option<String> = load_json(self.store.as_ref(), keys::CURRENT_CHAT);
        self.sessions.load(preferred.as_deref()).await?;
        self.remember_current_chat()
    }

    pub async fn refresh_chats(&mut self) -> Result<()> {
        self.sessions.refresh().await?;
        self.remember_current_chat()
    }

    pub async fn new_chat(&mut self) -> Result<ChatSession> {
        let session = self.sessions.create_session().await?.clone();
        self.remember_current_chat()?;
        Ok(session)
    }

    pub async fn switch_chat(&mut self, id: &str) -> Result<ChatSession> {
        let session = self.sessions.switch_session(id).await?.clone();
        self.remember_current_chat()?;
        Ok(session)
    }

    pub async fn delete_chat(&mut self, id: &str) -> Result<()> {
        self.sessions.delete_session(id).await?;
        self.remember_current_chat()
    }

    /// Send to the current session with the selected connection's tables as hints
    pub async fn send_message(&mut self, text: &str) -> Result<Option<String>> {
        let id = self
            .sessions
            .current_id()
            .map(str::to_string)
            .ok_or_else(|| Error::validation("No chat session loaded"))?;
        self.sessions.send_message(&id, text, &self.metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::connection::postgres;
    use crate::store::MemoryStore;

    fn app(fake: &Arc<FakeBackend>) -> (Arc<MemoryStore>, App) {
        let store = Arc::new(MemoryStore::new());
        let app = App::new(store.clone(), fake.clone(), true);
        (store, app)
    }

    #[tokio::test]
    async fn test_connect_stores_after_successful_test() {
        let fake = Arc::new(FakeBackend::new());
        let (_, mut app) = app(&fake);

        let conn = app
            .connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap();
        assert_eq!(app.connections().list_connections(), vec![conn]);
        assert_eq!(fake.calls(), vec!["health", "test_connection Sales"]);
    }

    #[tokio::test]
    async fn test_connect_checks_duplicates_before_network() {
        let fake = Arc::new(FakeBackend::new());
        let (_, mut app) = app(&fake);
        app.connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap();
        let calls = fake.calls().len();

        let err = app
            .connect(NewConnection::new("Again", postgres("db", "sales", "ada")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateConnection));
        assert_eq!(fake.calls().len(), calls);
        assert_eq!(app.connections().list_connections().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_reports_backend_down_and_rejections() {
        let fake = Arc::new(FakeBackend::new());
        let (_, mut app) = app(&fake);

        fake.state().down = true;
        let err = app
            .connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Cannot connect to the backend API"));
        assert_eq!(fake.count("test_connection"), 0);

        fake.state().down = false;
        fake.state().reject_connection = Some("password authentication failed".to_string());
        let err = app
            .connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "password authentication failed");
        assert!(app.connections().list_connections().is_empty());
    }

    #[tokio::test]
    async fn test_select_replaces_metadata_and_feeds_chat() {
        let fake = Arc::new(FakeBackend::new());
        let (_, mut app) = app(&fake);
        let conn = app
            .connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap();

        fake.state().metadata = vec![TableMetadata::new("orders", &[("id", "integer")])];
        app.select_connection("sales").await.unwrap();
        assert_eq!(app.metadata().len(), 1);
        assert_eq!(app.connections().selected().unwrap().id, conn.id);

        fake.state().metadata = vec![TableMetadata::new("users", &[("email", "text")])];
        let tables = app.refresh_metadata().await.unwrap();
        assert_eq!(tables[0].name, "users");

        app.load_chats().await.unwrap();
        app.send_message("list @users").await.unwrap();
        assert_eq!(fake.state().chat_requests[0].metadata.tables[0].columns, vec!["email"]);
    }

    #[tokio::test]
    async fn test_run_query_uses_selected_connection() {
        let fake = Arc::new(FakeBackend::new());
        let (_, mut app) = app(&fake);

        let err = app.run_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, Error::EmptyQuery));

        app.connect(NewConnection::new("Sales", postgres("db", "sales", "ada")))
            .await
            .unwrap();
        fake.state().rows = serde_json::from_str(r#"[{"n": 1}]"#).unwrap();
        let query = app.run_query("SELECT * FROM sales").await.unwrap();
        assert_eq!(query.title, "Select Sales");
    }

    #[tokio::test]
    async fn test_current_chat_survives_restart() {
        let fake = Arc::new(FakeBackend::new());
        let (store, mut app) = app(&fake);
        app.load_chats().await.unwrap();
        let first = app.new_chat().await.unwrap();
        let second = app.new_chat().await.unwrap();
        app.switch_chat(&first.id).await.unwrap();

        let mut reopened = App::new(store.clone(), fake.clone(), true);
        reopened.load_chats().await.unwrap();
        assert_eq!(reopened.sessions().current_id(), Some(first.id.as_str()));

        reopened.delete_chat(&first.id).await.unwrap();
        assert_eq!(reopened.sessions().current_id(), Some(second.id.as_str()));
    }
}
