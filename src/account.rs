//! Local profile gate and workspace title
//!
//! Users live only in the local store. There is no server-side account.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};
use crate::store::{keys, load_json, save_json, KeyValueStore};

pub const DUPLICATE_USER_MESSAGE: &str = "User with this email already exists. Please log in.";
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid email or password. New user? Please sign up.";
const FALLBACK_WORKSPACE: &str = "User's Workspace";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub struct Account {
    store: Arc<dyn KeyValueStore>,
}

impl Account {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn users(&self) -> Vec<User> {
        load_json(self.store.as_ref(), keys::USERS).unwrap_or_default()
    }

    fn start_session(&self, user: &User) -> Result<()> {
        save_json(self.store.as_ref(), keys::AUTHENTICATED, &true)?;
        save_json(self.store.as_ref(), keys::CURRENT_USER, user)
    }

    /// Register and log in; the workspace is named after the user
    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User> {
        for (field, value) in [("Name", name), ("Email", email), ("Password", password)] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{} is required", field)));
            }
        }

        let mut users = self.users();
        if users.iter().any(|u| same_email(&u.email, email)) {
            return Err(Error::validation(DUPLICATE_USER_MESSAGE));
        }

        let user = User {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash: hash_password(password),
        };
        users.push(user.clone());
        save_json(self.store.as_ref(), keys::USERS, &users)?;
        self.start_session(&user)?;
        save_json(
            self.store.as_ref(),
            keys::WORKSPACE_TITLE,
            &format!("{}'s Workspace", user.name),
        )?;

        info!(email = %user.email, "signed up");
        Ok(user)
    }

    pub fn log_in(&self, email: &str, password: &str) -> Result<User> {
        let hash = hash_password(password);
        let user = self
            .users()
            .into_iter()
            .find(|u| same_email(&u.email, email) && u.password_hash == hash)
            .ok_or_else(|| Error::validation(INVALID_LOGIN_MESSAGE))?;
        self.start_session(&user)?;
        info!(email = %user.email, "logged in");
        Ok(user)
    }

    pub fn log_out(&self) -> Result<()> {
        self.store.remove(keys::AUTHENTICATED)?;
        self.store.remove(keys::CURRENT_USER)
    }

    pub fn is_authenticated(&self) -> bool {
        load_json(self.store.as_ref(), keys::AUTHENTICATED).unwrap_or(false)
    }

    pub fn current_user(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        load_json(self.store.as_ref(), keys::CURRENT_USER)
    }

    /// Saved title, else "{name}'s Workspace", else "User's Workspace"
    pub fn workspace_title(&self) -> String {
        let saved: Option<String> = load_json(self.store.as_ref(), keys::WORKSPACE_TITLE);
        if let Some(title) = saved.filter(|t| !t.trim().is_empty()) {
            return title;
        }
        match self.current_user() {
            Some(user) if !user.name.is_empty() => format!("{}'s Workspace", user.name),
            _ => FALLBACK_WORKSPACE.to_string(),
        }
    }

    pub fn rename_workspace(&self, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("Workspace title cannot be empty"));
        }
        save_json(self.store.as_ref(), keys::WORKSPACE_TITLE, title)?;
        Ok(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn account() -> Account {
        Account::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_sign_up_logs_in_and_names_workspace() {
        let account = account();
        let user = account.sign_up("Ada", "ada@example.com", "hunter2").unwrap();

        assert!(account.is_authenticated());
        assert_eq!(account.current_user(), Some(user.clone()));
        assert_eq!(account.workspace_title(), "Ada's Workspace");
        assert_ne!(user.password_hash, "hunter2");
        assert_eq!(user.password_hash.len(), 64);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let account = account();
        account.sign_up("Ada", "ada@example.com", "pw").unwrap();
        let err = account
            .sign_up("Other", " ADA@example.com", "pw2")
            .unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_USER_MESSAGE);
    }

    #[test]
    fn test_log_in_and_out() {
        let account = account();
        account.sign_up("Ada", "ada@example.com", "pw").unwrap();
        account.log_out().unwrap();
        assert!(!account.is_authenticated());
        assert!(account.current_user().is_none());

        let err = account.log_in("ada@example.com", "wrong").unwrap_err();
        assert_eq!(err.to_string(), INVALID_LOGIN_MESSAGE);
        assert!(account.log_in("nobody@example.com", "pw").is_err());

        let user = account.log_in("ada@example.com", "pw").unwrap();
        assert_eq!(user.name, "Ada");
        assert!(account.is_authenticated());
    }

    #[test]
    fn test_workspace_title_fallbacks() {
        let account = account();
        assert_eq!(account.workspace_title(), "User's Workspace");

        assert!(account.rename_workspace("  ").is_err());
        account.rename_workspace(" Analytics ").unwrap();
        assert_eq!(account.workspace_title(), "Analytics");
    }
}
