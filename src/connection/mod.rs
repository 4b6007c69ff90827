//! Database connection descriptors and the local registry
//!
//! Backend kinds:
//! - PostgreSQL, MySQL: relational servers (host/port/credentials)
//! - ClickHouse: analytics server (host/port/credentials)
//! - Turso: hosted SQLite service (API key + organization)
//! - Cloudflare D1: serverless SQL (account + database id + API token)
//! - MotherDuck: serverless analytics (token)

mod registry;

pub use registry::ConnectionRegistry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Credentials for host-based servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCredentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TursoCredentials {
    pub database: String,
    pub api_key: String,
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct D1Credentials {
    pub account_id: String,
    pub database_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotherDuckCredentials {
    pub database: String,
    pub token: String,
}

/// Where a connection points, one variant per backend kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionTarget {
    Postgresql(ServerCredentials),
    Mysql(ServerCredentials),
    Clickhouse(ServerCredentials),
    #[serde(alias = "turbodb")]
    Turso(TursoCredentials),
    Cloudflare(D1Credentials),
    Motherduck(MotherDuckCredentials),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    Postgresql,
    Mysql,
    Clickhouse,
    Turso,
    Cloudflare,
    Motherduck,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Postgresql => "postgresql",
            ConnectionKind::Mysql => "mysql",
            ConnectionKind::Clickhouse => "clickhouse",
            ConnectionKind::Turso => "turso",
            ConnectionKind::Cloudflare => "cloudflare",
            ConnectionKind::Motherduck => "motherduck",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConnectionKind::Postgresql => "PostgreSQL",
            ConnectionKind::Mysql => "MySQL",
            ConnectionKind::Clickhouse => "ClickHouse",
            ConnectionKind::Turso => "Turso",
            ConnectionKind::Cloudflare => "Cloudflare D1",
            ConnectionKind::Motherduck => "MotherDuck",
        }
    }

    /// Default port for host-based kinds
    pub fn default_port(&self) -> Option<u16> {
        match self {
            ConnectionKind::Postgresql => Some(5432),
            ConnectionKind::Mysql => Some(3306),
            ConnectionKind::Clickhouse => Some(9440),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that identify "the same database" for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    kind: ConnectionKind,
    parts: Vec<String>,
}

impl ConnectionTarget {
    pub fn kind(&self) -> ConnectionKind {
        match self {
            ConnectionTarget::Postgresql(_) => ConnectionKind::Postgresql,
            ConnectionTarget::Mysql(_) => ConnectionKind::Mysql,
            ConnectionTarget::Clickhouse(_) => ConnectionKind::Clickhouse,
            ConnectionTarget::Turso(_) => ConnectionKind::Turso,
            ConnectionTarget::Cloudflare(_) => ConnectionKind::Cloudflare,
            ConnectionTarget::Motherduck(_) => ConnectionKind::Motherduck,
        }
    }

    pub fn server(&self) -> Option<&ServerCredentials> {
        match self {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => Some(c),
            _ => None,
        }
    }

    /// Server kinds: host + database + username.
    /// Turso: organization + database. D1: account + database id.
    /// MotherDuck: database.
    pub fn duplicate_key(&self) -> DuplicateKey {
        let parts = match self {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => {
                vec![c.host.clone(), c.database.clone(), c.username.clone()]
            }
            ConnectionTarget::Turso(c) => vec![c.organization.clone(), c.database.clone()],
            ConnectionTarget::Cloudflare(c) => vec![c.account_id.clone(), c.database_id.clone()],
            ConnectionTarget::Motherduck(c) => vec![c.database.clone()],
        };
        DuplicateKey {
            kind: self.kind(),
            parts,
        }
    }

    /// Short human-readable location, e.g. `db.example.com:5432/sales`
    pub fn summary(&self) -> String {
        match self {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => {
                format!("{}@{}:{}/{}", c.username, c.host, c.port, c.database)
            }
            ConnectionTarget::Turso(c) => format!("{}/{}", c.organization, c.database),
            ConnectionTarget::Cloudflare(c) => format!("{}/{}", c.account_id, c.database_id),
            ConnectionTarget::Motherduck(c) => format!("md:{}", c.database),
        }
    }

    /// Reject empty required fields, naming the first one missing
    pub fn validate(&self) -> Result<()> {
        let required: Vec<(&str, &str)> = match self {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => vec![
                ("Host", c.host.as_str()),
                ("Database", c.database.as_str()),
                ("Username", c.username.as_str()),
            ],
            ConnectionTarget::Turso(c) => vec![
                ("Database", c.database.as_str()),
                ("API key", c.api_key.as_str()),
                ("Organization", c.organization.as_str()),
            ],
            ConnectionTarget::Cloudflare(c) => vec![
                ("Account ID", c.account_id.as_str()),
                ("Database ID", c.database_id.as_str()),
                ("API token", c.api_token.as_str()),
            ],
            ConnectionTarget::Motherduck(c) => vec![
                ("Database", c.database.as_str()),
                ("Token", c.token.as_str()),
            ],
        };

        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::validation(format!("{} is required", field)));
        }
        if let Some(server) = self.server() {
            if server.port == 0 {
                return Err(Error::validation("Port must be between 1 and 65535"));
            }
        }
        Ok(())
    }
}

/// A stored connection record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConnection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub target: ConnectionTarget,
}

impl DatabaseConnection {
    pub fn kind(&self) -> ConnectionKind {
        self.target.kind()
    }
}

/// Connect-form input, before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub name: String,
    pub target: ConnectionTarget,
}

impl NewConnection {
    pub fn new(name: impl Into<String>, target: ConnectionTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Display name is required"));
        }
        self.target.validate()
    }
}

#[cfg(test)]
pub(crate) fn postgres(host: &str, database: &str, username: &str) -> ConnectionTarget {
    ConnectionTarget::Postgresql(ServerCredentials {
        host: host.to_string(),
        port: 5432,
        database: database.to_string(),
        username: username.to_string(),
        password: "secret".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape_is_tagged() {
        let conn = DatabaseConnection {
            id: "1700000000000".to_string(),
            name: "Warehouse".to_string(),
            last_used: None,
            target: ConnectionTarget::Cloudflare(D1Credentials {
                account_id: "acc".to_string(),
                database_id: "db".to_string(),
                api_token: "tok".to_string(),
            }),
        };
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["type"], "cloudflare");
        assert_eq!(json["accountId"], "acc");
        assert_eq!(json["apiToken"], "tok");
        assert_eq!(json["name"], "Warehouse");
    }

    #[test]
    fn test_legacy_turbodb_tag() {
        let json = r#"{"id":"1","name":"edge","type":"turbodb",
            "database":"main","apiKey":"k","organization":"acme"}"#;
        let conn: DatabaseConnection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.kind(), ConnectionKind::Turso);
    }

    #[test]
    fn test_duplicate_key_ignores_password_and_port() {
        let a = postgres("db.local", "sales", "ada");
        let mut b = postgres("db.local", "sales", "ada");
        if let ConnectionTarget::Postgresql(c) = &mut b {
            c.port = 6543;
            c.password = "other".to_string();
        }
        assert_eq!(a.duplicate_key(), b.duplicate_key());

        let mysql = ConnectionTarget::Mysql(a.server().unwrap().clone());
        assert_ne!(a.duplicate_key(), mysql.duplicate_key());
    }

    #[test]
    fn test_validate_names_missing_field() {
        let target = postgres("  ", "sales", "ada");
        let err = target.validate().unwrap_err();
        assert_eq!(err.to_string(), "Host is required");

        let draft = NewConnection::new("", postgres("h", "d", "u"));
        assert!(draft.validate().is_err());
    }
}
