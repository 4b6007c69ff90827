pub mod account;
pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod query;
pub mod session;
pub mod store;
pub mod suggest;
pub mod title;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use store::{KeyValueStore, SqliteStore};
