pub mod account;
pub mod chat;
pub mod connection;
pub mod query;
pub mod suggest;
