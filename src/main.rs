use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use t2sql::cli::connection::ConnectArgs;
use t2sql::cli::{account, chat, connection, query, suggest};
use t2sql::config::Config;
use t2sql::query::chart::ChartType;
use t2sql::App;

#[derive(Parser)]
#[command(name = "t2sql")]
#[command(about = "Text-to-SQL client: connections, queries and assistant chat")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "t2sql.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,

    /// Register a database connection after testing it
    Connect(ConnectArgs),

    /// Connection management
    Connections {
        #[command(subcommand)]
        command: ConnectionCommands,
    },

    /// Query tabs
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },

    /// Assistant chat sessions
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// Preview `@` and `/` suggestions for a line of input
    Suggest {
        /// Input text
        text: String,

        /// Cursor position in characters (defaults to the end)
        #[arg(long)]
        cursor: Option<usize>,

        /// Accept this suggestion value and print the edited text
        #[arg(long)]
        select: Option<String>,
    },

    /// Local account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Subcommand)]
enum ConnectionCommands {
    /// List connections (* marks the selected one)
    List,
    /// Select a connection and load its tables
    Select {
        /// Connection ID or name
        connection: String,
    },
    /// Show tables of the selected connection
    Tables,
    /// Rename a connection
    Rename {
        /// Connection ID or name
        connection: String,
        /// New display name
        name: String,
    },
    /// Remove a connection
    Remove {
        /// Connection ID or name
        connection: String,
    },
}

#[derive(Subcommand)]
enum QueryCommands {
    /// Run a query against the selected connection
    Run {
        /// Query text
        text: String,
    },
    /// Open an empty tab
    New,
    /// List tabs (* marks the active one)
    List,
    /// Open a tab and show its results
    Open { id: String },
    /// Delete a tab
    Delete { id: String },
    /// Chart the active tab's results
    Chart {
        /// bar, line or pie
        #[arg(short = 't', long = "type", default_value = "bar")]
        chart_type: ChartType,
        /// X axis column (defaults to the first column)
        #[arg(short, long)]
        x: Option<String>,
        /// Y axis column (defaults to the first numeric column)
        #[arg(short, long)]
        y: Option<String>,
    },
}

#[derive(Subcommand)]
enum ChatCommands {
    /// List chat sessions (* marks the current one)
    List,
    /// Show the current session
    Show,
    /// Start a new session
    New,
    /// Make a session current
    Switch { id: String },
    /// Delete a session
    Delete { id: String },
    /// Send a message to the current session
    Send {
        /// Message text; `@table` and `@table.column` are sent as hints
        text: String,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a local profile and log in
    Signup {
        name: String,
        email: String,
        password: String,
    },
    /// Log in to an existing profile
    Login { email: String, password: String },
    /// Log out
    Logout,
    /// Show the current user
    Whoami,
    /// Show or rename the workspace
    Workspace {
        /// New workspace title
        #[arg(long)]
        rename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,t2sql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    });

    // Initialize application state
    let mut app = App::open(&config)?;

    match cli.command {
        Commands::Health => {
            if app.backend_healthy().await {
                println!("Backend is up at {}", config.backend.endpoint_base());
            } else {
                anyhow::bail!(t2sql::error::BACKEND_UNAVAILABLE_MESSAGE);
            }
        }
        Commands::Connect(args) => {
            connection::connect(&mut app, args).await?;
        }
        Commands::Connections { command } => match command {
            ConnectionCommands::List => {
                connection::list(&app)?;
            }
            ConnectionCommands::Select { connection: target } => {
                connection::select(&mut app, &target).await?;
            }
            ConnectionCommands::Tables => {
                connection::tables(&mut app).await?;
            }
            ConnectionCommands::Rename {
                connection: target,
                name,
            } => {
                connection::rename(&app, &target, &name)?;
            }
            ConnectionCommands::Remove { connection: target } => {
                connection::remove(&app, &target)?;
            }
        },
        Commands::Query { command } => match command {
            QueryCommands::Run { text } => {
                query::run(&mut app, &text).await?;
            }
            QueryCommands::New => {
                query::create(&mut app)?;
            }
            QueryCommands::List => {
                query::list(&app)?;
            }
            QueryCommands::Open { id } => {
                query::open(&mut app, &id)?;
            }
            QueryCommands::Delete { id } => {
                query::delete(&mut app, &id)?;
            }
            QueryCommands::Chart { chart_type, x, y } => {
                query::chart(&app, chart_type, x, y)?;
            }
        },
        Commands::Chat { command } => match command {
            ChatCommands::List => {
                chat::list(&mut app).await?;
            }
            ChatCommands::Show => {
                chat::show(&mut app).await?;
            }
            ChatCommands::New => {
                chat::create(&mut app).await?;
            }
            ChatCommands::Switch { id } => {
                chat::switch(&mut app, &id).await?;
            }
            ChatCommands::Delete { id } => {
                chat::delete(&mut app, &id).await?;
            }
            ChatCommands::Send { text } => {
                chat::send(&mut app, &text).await?;
            }
        },
        Commands::Suggest {
            text,
            cursor,
            select,
        } => {
            suggest::run(
                &mut app,
                &text,
                cursor,
                select,
                config.suggestions.popover_width,
            )
            .await?;
        }
        Commands::Account { command } => match command {
            AccountCommands::Signup {
                name,
                email,
                password,
            } => {
                account::sign_up(&app, &name, &email, &password)?;
            }
            AccountCommands::Login { email, password } => {
                account::log_in(&app, &email, &password)?;
            }
            AccountCommands::Logout => {
                account::log_out(&app)?;
            }
            AccountCommands::Whoami => {
                account::whoami(&app)?;
            }
            AccountCommands::Workspace { rename } => {
                account::workspace(&app, rename)?;
            }
        },
    }

    Ok(())
}
