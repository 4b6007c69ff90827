//! Suggestion preview for a line of chat input

use anyhow::{bail, Result};

use crate::app::App;
use crate::suggest::{InputGeometry, MonospaceMeasure, SuggestionController, SuggestionState};

/// Pixel advance assumed per terminal cell
const CELL_PX: f32 = 8.0;
const TERMINAL_COLUMNS: f32 = 100.0;

pub async fn run(
    app: &mut App,
    text: &str,
    cursor: Option<usize>,
    select: Option<String>,
    popover_width: f32,
) -> Result<()> {
    let cursor = cursor.unwrap_or_else(|| text.chars().count());
    let mut controller = SuggestionController::new(
        MonospaceMeasure { char_width: CELL_PX },
        InputGeometry {
            right: TERMINAL_COLUMNS * CELL_PX,
            ..Default::default()
        },
        popover_width,
    );

    let state = controller.on_input(text, cursor).clone();
    if matches!(state, SuggestionState::ObjectSuggestOpen { .. })
        && app.connections().selected().is_some()
    {
        if let Err(e) = app.refresh_metadata().await {
            tracing::warn!(error = %e, "suggesting without table metadata");
        }
    }

    let Some(anchor) = state.anchor() else {
        println!("No suggestions at cursor {}.", cursor);
        return Ok(());
    };

    let suggestions = controller.suggestions(app.metadata());
    println!(
        "Popover at column {:.0}, row offset {:.0}",
        anchor.left / CELL_PX,
        anchor.top
    );
    for suggestion in &suggestions {
        println!("  {:<30} {}", suggestion.value(), suggestion.detail());
    }
    if suggestions.is_empty() {
        println!("  (no matches)");
    }

    if let Some(value) = select {
        let Some(edit) = controller.select(text, &value) else {
            bail!("No open suggestion to replace");
        };
        println!("{}", edit.text);
        println!("cursor: {}", edit.cursor);
    }
    Ok(())
}
