//! Chat commands

use anyhow::Result;

use crate::app::App;
use crate::session::{ChatSession, Role};

fn print_session(session: &ChatSession) {
    println!("{} [{}]", session.title, session.id);
    println!("{}", "-".repeat(60));
    if session.messages.is_empty() {
        println!("(no messages)");
    }
    for message in &session.messages {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{:>9}: {}", who, message.content);
    }
}

pub async fn list(app: &mut App) -> Result<()> {
    app.load_chats().await?;
    let sessions = app.sessions();
    let current = sessions.current_id();

    println!("{:<2} {:<38} {:<12} {:<6} {}", "", "ID", "Created", "Msgs", "Title");
    println!("{}", "-".repeat(90));
    for session in sessions.sessions() {
        let marker = if current == Some(session.id.as_str()) {
            "*"
        } else {
            ""
        };
        println!(
            "{:<2} {:<38} {:<12} {:<6} {}",
            marker,
            session.id,
            session.created_at.format("%m-%d %H:%M"),
            session.messages.len(),
            session.title
        );
    }
    Ok(())
}

pub async fn show(app: &mut App) -> Result<()> {
    app.load_chats().await?;
    if let Some(session) = app.sessions().current() {
        print_session(session);
    }
    Ok(())
}

pub async fn create(app: &mut App) -> Result<()> {
    app.load_chats().await?;
    let session = app.new_chat().await?;
    println!("Started {} [{}]", session.title, session.id);
    Ok(())
}

pub async fn switch(app: &mut App, id: &str) -> Result<()> {
    app.load_chats().await?;
    let session = app.switch_chat(id).await?;
    print_session(&session);
    Ok(())
}

pub async fn delete(app: &mut App, id: &str) -> Result<()> {
    app.load_chats().await?;
    app.delete_chat(id).await?;
    if let Some(current) = app.sessions().current() {
        println!("Deleted {}. Current chat: {} [{}]", id, current.title, current.id);
    }
    Ok(())
}

/// Send with the selected connection's tables available for `@` references
pub async fn send(app: &mut App, text: &str) -> Result<()> {
    app.load_chats().await?;
    if app.connections().selected().is_some() {
        if let Err(e) = app.refresh_metadata().await {
            tracing::warn!(error = %e, "sending without table metadata");
        }
    }

    match app.send_message(text).await? {
        Some(reply) => println!("{}", reply),
        None => println!("Nothing to send."),
    }
    Ok(())
}
