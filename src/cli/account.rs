//! Local account and workspace commands

use anyhow::Result;

use crate::app::App;

pub fn sign_up(app: &App, name: &str, email: &str, password: &str) -> Result<()> {
    let user = app.account().sign_up(name, email, password)?;
    println!("Welcome, {}. Workspace: {}", user.name, app.account().workspace_title());
    Ok(())
}

pub fn log_in(app: &App, email: &str, password: &str) -> Result<()> {
    let user = app.account().log_in(email, password)?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub fn log_out(app: &App) -> Result<()> {
    app.account().log_out()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    match app.account().current_user() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("Workspace: {}", app.account().workspace_title());
        }
        None => println!("Not logged in. Run 't2sql account login' or 't2sql account signup'."),
    }
    Ok(())
}

pub fn workspace(app: &App, rename: Option<String>) -> Result<()> {
    let title = match rename {
        Some(title) => app.account().rename_workspace(&title)?,
        None => app.account().workspace_title(),
    };
    println!("{}", title);
    Ok(())
}
