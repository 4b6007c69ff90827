//! Query tabs and the query runner
//!
//! A tab pairs literal query text with its most recent result set. Running a
//! query opens a new tab titled from the text; the editor, the visible
//! results and the last error string are tab state as well.

pub mod chart;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{Backend, Row};
use crate::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::store::{keys, load_json, next_id, save_json, KeyValueStore};
use crate::title::{query_title, DEFAULT_QUERY_TITLE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub results: Option<Vec<Row>>,
}

pub struct QueryTabs {
    store: Arc<dyn KeyValueStore>,
    persist: bool,
    queries: Vec<Query>,
    active: Option<String>,
    editor: String,
    results: Option<Vec<Row>>,
    error: Option<String>,
}

impl QueryTabs {
    /// Restore tabs from the store when `persist` is set
    pub fn new(store: Arc<dyn KeyValueStore>, persist: bool) -> Self {
        let mut tabs = Self {
            store,
            persist,
            queries: Vec::new(),
            active: None,
            editor: String::new(),
            results: None,
            error: None,
        };
        if persist {
            tabs.queries = load_json(tabs.store.as_ref(), keys::QUERIES).unwrap_or_default();
            let active: Option<String> = load_json(tabs.store.as_ref(), keys::ACTIVE_QUERY);
            if let Some(query) = active.and_then(|id| tabs.find(&id).cloned()) {
                tabs.active = Some(query.id);
                tabs.editor = query.content;
                tabs.results = query.results;
            }
        }
        tabs
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    fn find(&self, id: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.id == id)
    }

    pub fn active(&self) -> Option<&Query> {
        self.active.as_deref().and_then(|id| self.find(id))
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn results(&self) -> Option<&[Row]> {
        self.results.as_deref()
    }

    /// Last error, cleared by the next run or load
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn save(&self) -> Result<()> {
        if !self.persist {
            return Ok(());
        }
        save_json(self.store.as_ref(), keys::QUERIES, &self.queries)?;
        match &self.active {
            Some(id) => save_json(self.store.as_ref(), keys::ACTIVE_QUERY, id),
            None => self.store.remove(keys::ACTIVE_QUERY),
        }
    }

    fn fail(&mut self, error: Error) -> Error {
        self.error = Some(error.to_string());
        error
    }

    /// Run `text` against `connection` and open a tab with the results
    ///
    /// Blank text or a missing connection fails before any request is made.
    pub async fn run_query(
        &mut self,
        backend: &dyn Backend,
        text: &str,
        connection: Option<&DatabaseConnection>,
    ) -> Result<&Query> {
        self.editor = text.to_string();
        let connection = match connection {
            Some(conn) if !text.trim().is_empty() => conn,
            _ => return Err(self.fail(Error::EmptyQuery)),
        };

        self.error = None;
        self.results = None;
        debug!(connection = %connection.id, "running query");

        let rows = match backend.execute_query(text, &connection.target).await {
            Ok(rows) if rows.is_empty() => return Err(self.fail(Error::NoResults)),
            Ok(rows) => rows,
            Err(e) => return Err(self.fail(e)),
        };

        let query = Query {
            id: next_id(self.queries.iter().map(|q| q.id.as_str())),
            title: query_title(text),
            content: text.to_string(),
            created_at: Utc::now(),
            results: Some(rows.clone()),
        };
        info!(id = %query.id, rows = rows.len(), title = %query.title, "query finished");

        self.results = Some(rows);
        self.active = Some(query.id.clone());
        self.queries.push(query);
        self.save()?;
        Ok(&self.queries[self.queries.len() - 1])
    }

    /// Open an empty "New Query" tab
    pub fn create_query(&mut self) -> Result<&Query> {
        let query = Query {
            id: next_id(self.queries.iter().map(|q| q.id.as_str())),
            title: DEFAULT_QUERY_TITLE.to_string(),
            content: String::new(),
            created_at: Utc::now(),
            results: None,
        };
        self.active = Some(query.id.clone());
        self.editor.clear();
        self.results = None;
        self.error = None;
        self.queries.push(query);
        self.save()?;
        Ok(&self.queries[self.queries.len() - 1])
    }

    /// Restore a tab's text and results into the editor
    pub fn load_query(&mut self, id: &str) -> Result<&Query> {
        let query = self
            .find(id)
            .cloned()
            .ok_or_else(|| Error::not_found("Query", id))?;
        self.active = Some(query.id);
        self.editor = query.content;
        self.results = query.results;
        self.error = None;
        self.save()?;
        self.active().ok_or_else(|| Error::not_found("Query", id))
    }

    /// Returns whether a tab was removed; deleting the active tab clears the editor
    pub fn delete_query(&mut self, id: &str) -> Result<bool> {
        let before = self.queries.len();
        self.queries.retain(|q| q.id != id);
        if self.queries.len() == before {
            return Ok(false);
        }
        if self.active.as_deref() == Some(id) {
            self.active = None;
            self.editor.clear();
        }
        self.save()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::connection::postgres;
    use crate::error::EMPTY_QUERY_MESSAGE;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn connection() -> DatabaseConnection {
        DatabaseConnection {
            id: "1".to_string(),
            name: "Sales".to_string(),
            last_used: None,
            target: postgres("db", "sales", "ada"),
        }
    }

    fn sample_rows() -> Vec<Row> {
        serde_json::from_value(json!([{"region": "north", "total": 10}])).unwrap()
    }

    #[tokio::test]
    async fn test_empty_query_guard_makes_no_request() {
        let fake = FakeBackend::new();
        let mut tabs = QueryTabs::new(Arc::new(MemoryStore::new()), false);
        let conn = connection();

        let err = tabs.run_query(&fake, "   ", Some(&conn)).await.unwrap_err();
        assert!(matches!(err, Error::EmptyQuery));
        assert_eq!(tabs.error(), Some(EMPTY_QUERY_MESSAGE));

        tabs.run_query(&fake, "SELECT 1", None).await.unwrap_err();
        assert_eq!(tabs.error(), Some(EMPTY_QUERY_MESSAGE));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_opens_titled_tab() {
        let fake = FakeBackend::new();
        fake.state().rows = sample_rows();
        let mut tabs = QueryTabs::new(Arc::new(MemoryStore::new()), false);

        let query = tabs
            .run_query(&fake, "SELECT * FROM sales", Some(&connection()))
            .await
            .unwrap();
        assert_eq!(query.title, "Select Sales");
        assert_eq!(query.results.as_ref().unwrap().len(), 1);

        assert_eq!(tabs.active().unwrap().content, "SELECT * FROM sales");
        assert_eq!(tabs.results().unwrap()[0]["total"], 10);
        assert!(tabs.error().is_none());
        assert_eq!(fake.calls(), vec!["query SELECT * FROM sales"]);
    }

    #[tokio::test]
    async fn test_empty_data_and_server_errors() {
        let fake = FakeBackend::new();
        let mut tabs = QueryTabs::new(Arc::new(MemoryStore::new()), false);
        let conn = connection();

        let err = tabs.run_query(&fake, "SELECT 1", Some(&conn)).await.unwrap_err();
        assert!(matches!(err, Error::NoResults));
        assert_eq!(tabs.error(), Some("No results returned"));

        fake.state().query_error = Some("relation \"nope\" does not exist".to_string());
        tabs.run_query(&fake, "SELECT * FROM nope", Some(&conn))
            .await
            .unwrap_err();
        assert_eq!(tabs.error(), Some("relation \"nope\" does not exist"));
        assert!(tabs.queries().is_empty());
    }

    #[tokio::test]
    async fn test_create_load_delete() {
        let fake = FakeBackend::new();
        fake.state().rows = sample_rows();
        let mut tabs = QueryTabs::new(Arc::new(MemoryStore::new()), false);

        let ran = tabs
            .run_query(&fake, "show monthly sales", Some(&connection()))
            .await
            .unwrap()
            .id
            .clone();
        let blank = tabs.create_query().unwrap().clone();
        assert_eq!(blank.title, DEFAULT_QUERY_TITLE);
        assert_ne!(blank.id, ran);
        assert_eq!(tabs.editor(), "");
        assert!(tabs.results().is_none());

        tabs.load_query(&ran).unwrap();
        assert_eq!(tabs.editor(), "show monthly sales");
        assert!(tabs.results().is_some());
        assert!(tabs.load_query("missing").is_err());

        assert!(tabs.delete_query(&ran).unwrap());
        assert!(tabs.active().is_none());
        assert_eq!(tabs.editor(), "");
        assert!(!tabs.delete_query(&ran).unwrap());
        assert_eq!(tabs.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_tabs_persist_between_instances() {
        let fake = FakeBackend::new();
        fake.state().rows = sample_rows();
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut tabs = QueryTabs::new(store.clone(), true);
        tabs.run_query(&fake, "SELECT * FROM sales", Some(&connection()))
            .await
            .unwrap();

        let reopened = QueryTabs::new(store.clone(), true);
        assert_eq!(reopened.queries().len(), 1);
        assert_eq!(reopened.editor(), "SELECT * FROM sales");
        assert!(reopened.results().is_some());

        let volatile = QueryTabs::new(store, false);
        assert!(volatile.queries().is_empty());
    }
}
