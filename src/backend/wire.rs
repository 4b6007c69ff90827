//! Request and response bodies of the backend contract

use serde::{Deserialize, Serialize};

use super::{ColumnMetadata, Row, TableMetadata};
use crate::connection::{ConnectionTarget, DatabaseConnection};

/// Kind-specific credentials sent with metadata and query requests
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Credentials<'a> {
    Server {
        host: &'a str,
        port: u16,
        database: &'a str,
        username: &'a str,
        password: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Turso {
        database: &'a str,
        api_key: &'a str,
        organization: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Cloudflare {
        account_id: &'a str,
        api_token: &'a str,
        database_id: &'a str,
    },
    MotherDuck {
        database: &'a str,
        token: &'a str,
    },
}

impl<'a> From<&'a ConnectionTarget> for Credentials<'a> {
    fn from(target: &'a ConnectionTarget) -> Self {
        match target {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => Credentials::Server {
                host: &c.host,
                port: c.port,
                database: &c.database,
                username: &c.username,
                password: &c.password,
            },
            ConnectionTarget::Turso(c) => Credentials::Turso {
                database: &c.database,
                api_key: &c.api_key,
                organization: &c.organization,
            },
            ConnectionTarget::Cloudflare(c) => Credentials::Cloudflare {
                account_id: &c.account_id,
                api_token: &c.api_token,
                database_id: &c.database_id,
            },
            ConnectionTarget::Motherduck(c) => Credentials::MotherDuck {
                database: &c.database,
                token: &c.token,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct QueryRequest<'a> {
    pub query: &'a str,
    #[serde(flatten)]
    pub credentials: Credentials<'a>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponse {
    #[serde(default)]
    pub data: Option<Vec<Row>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub response: String,
}

/// Body of `test-connection`; the backend reads snake_case and flat fields
#[derive(Debug, Default, Serialize)]
pub(super) struct TestConnectionRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<&'a str>,
}

impl<'a> From<&'a DatabaseConnection> for TestConnectionRequest<'a> {
    fn from(conn: &'a DatabaseConnection) -> Self {
        let base = TestConnectionRequest {
            kind: conn.kind().as_str(),
            display_name: &conn.name,
            ..Default::default()
        };
        match &conn.target {
            ConnectionTarget::Postgresql(c)
            | ConnectionTarget::Mysql(c)
            | ConnectionTarget::Clickhouse(c) => TestConnectionRequest {
                host: Some(&c.host),
                port: Some(c.port),
                database: Some(&c.database),
                username: Some(&c.username),
                password: Some(&c.password),
                ..base
            },
            ConnectionTarget::Turso(c) => TestConnectionRequest {
                database: Some(&c.database),
                api_key: Some(&c.api_key),
                organization: Some(&c.organization),
                ..base
            },
            ConnectionTarget::Cloudflare(c) => TestConnectionRequest {
                account_id: Some(&c.account_id),
                database_id: Some(&c.database_id),
                api_token: Some(&c.api_token),
                ..base
            },
            ConnectionTarget::Motherduck(c) => TestConnectionRequest {
                database: Some(&c.database),
                token: Some(&c.token),
                ..base
            },
        }
    }
}

/// Table hint sent with chat messages: referenced table and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHint {
    pub name: String,
    pub columns: Vec<String>,
}

/// `{ "orders": [["id", "integer"], ...], ... }` -> ordered table list
///
/// Only the first two entries of each column row are read; anything after
/// the type (nullability and the like) is ignored.
pub(super) fn parse_metadata(body: serde_json::Value) -> serde_json::Result<Vec<TableMetadata>> {
    let tables: serde_json::Map<String, serde_json::Value> = serde_json::from_value(body)?;
    tables
        .into_iter()
        .map(|(name, columns)| -> serde_json::Result<TableMetadata> {
            let rows: Vec<Vec<serde_json::Value>> = serde_json::from_value(columns)?;
            Ok(TableMetadata {
                name,
                columns: rows.into_iter().filter_map(column_from_row).collect(),
            })
        })
        .collect()
}

fn column_from_row(row: Vec<serde_json::Value>) -> Option<ColumnMetadata> {
    let mut fields = row.into_iter();
    let name = match fields.next()? {
        serde_json::Value::String(name) => name,
        _ => return None,
    };
    let data_type = match fields.next() {
        Some(serde_json::Value::String(data_type)) => data_type,
        _ => String::new(),
    };
    Some(ColumnMetadata { name, data_type })
}

/// Human-readable reason from an error body: `detail`, `message`, then `error`
pub(super) fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"].iter().find_map(|field| {
        match json.get(field)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            // FastAPI validation errors carry a list of {msg, ...}
            serde_json::Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{postgres, D1Credentials};
    use serde_json::json;

    #[test]
    fn test_query_request_shapes() {
        let pg = postgres("db.local", "sales", "ada");
        let body = serde_json::to_value(QueryRequest {
            query: "SELECT 1",
            credentials: (&pg).into(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"query": "SELECT 1", "host": "db.local", "port": 5432,
                   "database": "sales", "username": "ada", "password": "secret"})
        );

        let d1 = ConnectionTarget::Cloudflare(D1Credentials {
            account_id: "acc".to_string(),
            database_id: "db".to_string(),
            api_token: "tok".to_string(),
        });
        let body = serde_json::to_value(Credentials::from(&d1)).unwrap();
        assert_eq!(body, json!({"accountId": "acc", "apiToken": "tok", "databaseId": "db"}));
    }

    #[test]
    fn test_test_connection_body() {
        let conn = DatabaseConnection {
            id: "1".to_string(),
            name: "Sales".to_string(),
            last_used: None,
            target: postgres("db.local", "sales", "ada"),
        };
        let body = serde_json::to_value(TestConnectionRequest::from(&conn)).unwrap();
        assert_eq!(body["type"], "postgresql");
        assert_eq!(body["display_name"], "Sales");
        assert_eq!(body["port"], 5432);
        assert!(body.get("token").is_none());
    }

    #[test]
    fn test_parse_metadata_keeps_order() {
        let body = json!({
            "orders": [["id", "integer"], ["total", "numeric"]],
            "customers": [["id", "integer"]]
        });
        let tables = parse_metadata(body).unwrap();
        assert_eq!(tables[0].name, "orders");
        assert_eq!(tables[0].column_names(), vec!["id", "total"]);
        assert_eq!(tables[0].columns[1].data_type, "numeric");
        assert_eq!(tables[1].name, "customers");
    }

    #[test]
    fn test_parse_metadata_ignores_extra_fields() {
        let body = json!({"orders": [["id", "integer", "NO"], ["note", "text", "YES", null]]});
        let tables = parse_metadata(body).unwrap();
        assert_eq!(tables[0].column_names(), vec!["id", "note"]);
        assert_eq!(tables[0].columns[0].data_type, "integer");
        assert_eq!(tables[0].columns[1].data_type, "text");
    }

    #[test]
    fn test_error_message_fields() {
        assert_eq!(
            error_message(r#"{"detail":"Invalid username or password"}"#).as_deref(),
            Some("Invalid username or password")
        );
        assert_eq!(
            error_message(r#"{"message":"boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(
            error_message(r#"{"detail":[{"msg":"field required"},{"msg":"bad port"}]}"#)
                .as_deref(),
            Some("field required; bad port")
        );
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"detail":""}"#), None);
    }
}
