//! Connection commands

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

use crate::app::App;
use crate::connection::{
    ConnectionKind, ConnectionTarget, D1Credentials, MotherDuckCredentials, NewConnection,
    ServerCredentials, TursoCredentials,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Postgresql,
    Mysql,
    Clickhouse,
    #[value(alias = "turbodb")]
    Turso,
    Cloudflare,
    Motherduck,
}

impl From<KindArg> for ConnectionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Postgresql => ConnectionKind::Postgresql,
            KindArg::Mysql => ConnectionKind::Mysql,
            KindArg::Clickhouse => ConnectionKind::Clickhouse,
            KindArg::Turso => ConnectionKind::Turso,
            KindArg::Cloudflare => ConnectionKind::Cloudflare,
            KindArg::Motherduck => ConnectionKind::Motherduck,
        }
    }
}

/// Connect-form fields; which ones are required depends on the kind
#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Backend kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Display name
    #[arg(short, long)]
    pub name: String,

    #[arg(long)]
    pub host: Option<String>,

    /// Defaults to the kind's standard port
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(short, long)]
    pub database: Option<String>,

    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long)]
    pub password: Option<String>,

    /// Turso API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Turso organization
    #[arg(long)]
    pub organization: Option<String>,

    /// Cloudflare account ID
    #[arg(long)]
    pub account_id: Option<String>,

    /// Cloudflare D1 database ID
    #[arg(long)]
    pub database_id: Option<String>,

    /// Cloudflare API token
    #[arg(long)]
    pub api_token: Option<String>,

    /// MotherDuck token
    #[arg(long)]
    pub token: Option<String>,
}

impl ConnectArgs {
    /// Missing fields become empty strings so validation can name them
    pub fn into_draft(self) -> NewConnection {
        let kind = ConnectionKind::from(self.kind);
        let text = |v: Option<String>| v.unwrap_or_default();

        let target = match kind {
            ConnectionKind::Postgresql | ConnectionKind::Mysql | ConnectionKind::Clickhouse => {
                let server = ServerCredentials {
                    host: text(self.host),
                    port: self.port.or(kind.default_port()).unwrap_or_default(),
                    database: text(self.database),
                    username: text(self.username),
                    password: text(self.password),
                };
                match kind {
                    ConnectionKind::Postgresql => ConnectionTarget::Postgresql(server),
                    ConnectionKind::Mysql => ConnectionTarget::Mysql(server),
                    _ => ConnectionTarget::Clickhouse(server),
                }
            }
            ConnectionKind::Turso => ConnectionTarget::Turso(TursoCredentials {
                database: text(self.database),
                api_key: text(self.api_key),
                organization: text(self.organization),
            }),
            ConnectionKind::Cloudflare => ConnectionTarget::Cloudflare(D1Credentials {
                account_id: text(self.account_id),
                database_id: text(self.database_id),
                api_token: text(self.api_token),
            }),
            ConnectionKind::Motherduck => ConnectionTarget::Motherduck(MotherDuckCredentials {
                database: text(self.database),
                token: text(self.token),
            }),
        };
        NewConnection::new(self.name, target)
    }
}

pub async fn connect(app: &mut App, args: ConnectArgs) -> Result<()> {
    let conn = app.connect(args.into_draft()).await?;
    println!(
        "Connected {} ({}) [{}]",
        conn.name,
        conn.kind().display_name(),
        conn.id
    );
    Ok(())
}

pub fn list(app: &App) -> Result<()> {
    let connections = app.connections().list_connections();
    if connections.is_empty() {
        println!("No connections found. Run 't2sql connect' first.");
        return Ok(());
    }

    let selected = app.connections().selected().map(|c| c.id);

    println!(
        "{:<2} {:<15} {:<20} {:<14} {:<12} {}",
        "", "ID", "Name", "Type", "Last used", "Location"
    );
    println!("{}", "-".repeat(90));

    for conn in connections {
        let marker = if selected.as_deref() == Some(conn.id.as_str()) {
            "*"
        } else {
            ""
        };
        let last_used = conn
            .last_used
            .map(|ts| ts.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<2} {:<15} {:<20} {:<14} {:<12} {}",
            marker,
            conn.id,
            conn.name,
            conn.kind().display_name(),
            last_used,
            conn.target.summary(),
        );
    }

    Ok(())
}

pub async fn select(app: &mut App, connection: &str) -> Result<()> {
    let tables = app.select_connection(connection).await?;
    println!("Selected {} ({} tables)", connection, tables.len());
    Ok(())
}

pub async fn tables(app: &mut App) -> Result<()> {
    let tables = app.refresh_metadata().await?;
    if tables.is_empty() {
        println!("No tables found.");
        return Ok(());
    }

    for table in tables {
        println!("{}", table.name);
        for column in &table.columns {
            println!("  {:<30} {}", column.name, column.data_type);
        }
    }
    Ok(())
}

pub fn rename(app: &App, connection: &str, name: &str) -> Result<()> {
    let Some(conn) = app.connections().find(connection) else {
        bail!("Connection not found: {}", connection);
    };
    let renamed = app.connections().rename_connection(&conn.id, name)?;
    println!("Renamed {} to {}", conn.name, renamed.name);
    Ok(())
}

pub fn remove(app: &App, connection: &str) -> Result<()> {
    let Some(conn) = app.connections().find(connection) else {
        bail!("Connection not found: {}", connection);
    };
    app.connections().remove_connection(&conn.id)?;
    println!("Removed {}", conn.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ConnectArgs,
    }

    #[test]
    fn test_server_draft_uses_default_port() {
        let cli = TestCli::parse_from([
            "t2sql", "mysql", "--name", "Shop", "--host", "db", "-d", "shop", "-u", "root",
        ]);
        let draft = cli.args.into_draft();
        let server = draft.target.server().unwrap();
        assert_eq!(server.port, 3306);
        assert_eq!(draft.target.kind(), ConnectionKind::Mysql);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let cli = TestCli::parse_from(["t2sql", "turbodb", "--name", "Edge", "-d", "main"]);
        let draft = cli.args.into_draft();
        assert_eq!(draft.target.kind(), ConnectionKind::Turso);
        assert_eq!(draft.validate().unwrap_err().to_string(), "API key is required");
    }
}
