use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::{DatabaseConnection, NewConnection};
use crate::error::{Error, Result};
use crate::store::{keys, load_json, next_id, save_json, KeyValueStore};

/// Connection records kept in local storage
///
/// The persisted array is the source of truth: every operation re-reads it,
/// so two registries over the same store never drift.
pub struct ConnectionRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All stored connections; absent or malformed storage yields an empty list
    pub fn list_connections(&self) -> Vec<DatabaseConnection> {
        load_json(self.store.as_ref(), keys::CONNECTIONS).unwrap_or_default()
    }

    fn save(&self, connections: &[DatabaseConnection]) -> Result<()> {
        save_json(self.store.as_ref(), keys::CONNECTIONS, connections)
    }

    pub fn get(&self, id: &str) -> Option<DatabaseConnection> {
        self.list_connections().into_iter().find(|c| c.id == id)
    }

    /// Look up by exact id, then by display name (case-insensitive)
    pub fn find(&self, id_or_name: &str) -> Option<DatabaseConnection> {
        let connections = self.list_connections();
        if let Some(conn) = connections.iter().find(|c| c.id == id_or_name) {
            return Some(conn.clone());
        }
        connections
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(id_or_name))
    }

    /// Whether `draft` would duplicate an existing record, ignoring `except_id`
    pub fn is_duplicate(&self, draft: &NewConnection, except_id: Option<&str>) -> bool {
        let key = draft.target.duplicate_key();
        self.list_connections()
            .iter()
            .filter(|c| Some(c.id.as_str()) != except_id)
            .any(|c| c.target.duplicate_key() == key)
    }

    pub fn add_connection(&self, draft: NewConnection) -> Result<DatabaseConnection> {
        draft.validate()?;

        let mut connections = self.list_connections();
        let key = draft.target.duplicate_key();
        if connections.iter().any(|c| c.target.duplicate_key() == key) {
            return Err(Error::DuplicateConnection);
        }

        let connection = DatabaseConnection {
            id: next_id(connections.iter().map(|c| c.id.as_str())),
            name: draft.name.trim().to_string(),
            last_used: Some(Utc::now()),
            target: draft.target,
        };
        connections.push(connection.clone());
        self.save(&connections)?;

        info!(id = %connection.id, kind = %connection.kind(), "connection added");
        Ok(connection)
    }

    /// Replace name and credentials of an existing record
    pub fn update_connection(&self, id: &str, draft: NewConnection) -> Result<DatabaseConnection> {
        draft.validate()?;
        if self.is_duplicate(&draft, Some(id)) {
            return Err(Error::DuplicateConnection);
        }

        let mut connections = self.list_connections();
        let conn = connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Connection", id))?;
        conn.name = draft.name.trim().to_string();
        conn.target = draft.target;
        let updated = conn.clone();
        self.save(&connections)?;
        Ok(updated)
    }

    /// Returns whether a record was removed
    pub fn remove_connection(&self, id: &str) -> Result<bool> {
        let mut connections = self.list_connections();
        let before = connections.len();
        connections.retain(|c| c.id != id);
        if connections.len() == before {
            return Ok(false);
        }
        self.save(&connections)?;

        if self.selected_id().as_deref() == Some(id) {
            self.store.remove(keys::SELECTED_CONNECTION)?;
        }
        debug!(id, "connection removed");
        Ok(true)
    }

    pub fn rename_connection(&self, id: &str, new_name: &str) -> Result<DatabaseConnection> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::validation("Name cannot be empty"));
        }

        let mut connections = self.list_connections();
        let conn = connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Connection", id))?;
        conn.name = new_name.to_string();
        let renamed = conn.clone();
        self.save(&connections)?;
        Ok(renamed)
    }

    pub fn mark_used(&self, id: &str) -> Result<()> {
        let mut connections = self.list_connections();
        if let Some(conn) = connections.iter_mut().find(|c| c.id == id) {
            conn.last_used = Some(Utc::now());
            self.save(&connections)?;
        }
        Ok(())
    }

    fn selected_id(&self) -> Option<String> {
        load_json(self.store.as_ref(), keys::SELECTED_CONNECTION)
    }

    pub fn select(&self, id: &str) -> Result<DatabaseConnection> {
        let conn = self
            .get(id)
            .ok_or_else(|| Error::not_found("Connection", id))?;
        save_json(self.store.as_ref(), keys::SELECTED_CONNECTION, &conn.id)?;
        Ok(conn)
    }

    /// The selected connection, defaulting to the first stored one
    pub fn selected(&self) -> Option<DatabaseConnection> {
        let connections = self.list_connections();
        if let Some(id) = self.selected_id() {
            if let Some(conn) = connections.iter().find(|c| c.id == id) {
                return Some(conn.clone());
            }
        }
        connections.into_iter().next()
    }
}
