//! Inline `@object` and `/command` suggestions for the chat input
//!
//! Pure state over a text buffer and a cursor index. Rendering is left to
//! the caller; only the anchor point needs a [`TextMeasure`].

mod position;
mod scanner;

pub use position::{anchor, AnchorPosition, InputGeometry, MonospaceMeasure, TextMeasure};
pub use scanner::{apply_selection, scan, Edit, Marker, Trigger};

use crate::backend::TableMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const COMMANDS: &[Command] = &[
    Command {
        id: "explain",
        name: "Explain Code",
        description: "Explain code for current cell",
    },
    Command {
        id: "prettify",
        name: "Prettify Code",
        description: "Prettify my code",
    },
    Command {
        id: "findTables",
        name: "Find Tables",
        description: "Find tables to query",
    },
    Command {
        id: "optimize",
        name: "Optimize Code",
        description: "Optimize my code",
    },
    Command {
        id: "scratchpad",
        name: "Create Scratchpad",
        description: "Create a code cell usable like a scratchpad",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Table {
        name: String,
    },
    Column {
        table: String,
        name: String,
        data_type: String,
    },
    Command(Command),
}

impl Suggestion {
    /// Text inserted after the marker when selected
    pub fn value(&self) -> String {
        match self {
            Suggestion::Table { name } => name.clone(),
            Suggestion::Column { table, name, .. } => format!("{}.{}", table, name),
            Suggestion::Command(command) => command.id.to_string(),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Suggestion::Table { .. } => "table".to_string(),
            Suggestion::Column { data_type, .. } => data_type.clone(),
            Suggestion::Command(command) => command.description.to_string(),
        }
    }
}

/// Tables then columns matching `partial` by case-insensitive prefix
///
/// `table.col` narrows to that table's columns.
pub fn object_suggestions(partial: &str, tables: &[TableMetadata]) -> Vec<Suggestion> {
    let column = |table: &TableMetadata, c: &crate::backend::ColumnMetadata| Suggestion::Column {
        table: table.name.clone(),
        name: c.name.clone(),
        data_type: c.data_type.clone(),
    };

    if let Some((table_part, column_part)) = partial.split_once('.') {
        let lowered = column_part.to_lowercase();
        let prefix = lowered.as_str();
        return tables
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case(table_part))
            .flat_map(|t| {
                t.columns
                    .iter()
                    .filter(move |c| c.name.to_lowercase().starts_with(prefix))
                    .map(move |c| column(t, c))
            })
            .collect();
    }

    let lowered = partial.to_lowercase();
    let prefix = lowered.as_str();
    let matching_tables = tables
        .iter()
        .filter(|t| t.name.to_lowercase().starts_with(prefix))
        .map(|t| Suggestion::Table {
            name: t.name.clone(),
        });
    let matching_columns = tables.iter().flat_map(|t| {
        t.columns
            .iter()
            .filter(move |c| c.name.to_lowercase().starts_with(prefix))
            .map(move |c| column(t, c))
    });
    matching_tables.chain(matching_columns).collect()
}

/// Commands whose id, name or description contains `partial`
pub fn command_suggestions(partial: &str) -> Vec<Suggestion> {
    let needle = partial.to_lowercase();
    COMMANDS
        .iter()
        .filter(|c| {
            [c.id, c.name, c.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .map(|c| Suggestion::Command(*c))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionState {
    Idle,
    ObjectSuggestOpen {
        trigger: Trigger,
        anchor: AnchorPosition,
    },
    CommandSuggestOpen {
        trigger: Trigger,
        anchor: AnchorPosition,
    },
}

impl SuggestionState {
    pub fn trigger(&self) -> Option<&Trigger> {
        match self {
            SuggestionState::Idle => None,
            SuggestionState::ObjectSuggestOpen { trigger, .. }
            | SuggestionState::CommandSuggestOpen { trigger, .. } => Some(trigger),
        }
    }

    pub fn anchor(&self) -> Option<AnchorPosition> {
        match self {
            SuggestionState::Idle => None,
            SuggestionState::ObjectSuggestOpen { anchor, .. }
            | SuggestionState::CommandSuggestOpen { anchor, .. } => Some(*anchor),
        }
    }
}

/// Drives the popover from input events
pub struct SuggestionController<M: TextMeasure> {
    measure: M,
    input: InputGeometry,
    popover_width: f32,
    state: SuggestionState,
}

impl<M: TextMeasure> SuggestionController<M> {
    pub fn new(measure: M, input: InputGeometry, popover_width: f32) -> Self {
        Self {
            measure,
            input,
            popover_width,
            state: SuggestionState::Idle,
        }
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SuggestionState::Idle
    }

    /// Re-scan after every edit or cursor move
    pub fn on_input(&mut self, text: &str, cursor: usize) -> &SuggestionState {
        self.state = match scan(text, cursor) {
            None => SuggestionState::Idle,
            Some(trigger) => {
                let before: String = text.chars().take(cursor).collect();
                let anchor = anchor(&self.input, &before, &self.measure, self.popover_width);
                match trigger.marker {
                    Marker::Object => SuggestionState::ObjectSuggestOpen { trigger, anchor },
                    Marker::Command => SuggestionState::CommandSuggestOpen { trigger, anchor },
                }
            }
        };
        &self.state
    }

    pub fn on_escape(&mut self) {
        self.close();
    }

    pub fn close(&mut self) {
        self.state = SuggestionState::Idle;
    }

    /// Items for the open popover; empty when idle
    pub fn suggestions(&self, tables: &[TableMetadata]) -> Vec<Suggestion> {
        match &self.state {
            SuggestionState::Idle => Vec::new(),
            SuggestionState::ObjectSuggestOpen { trigger, .. } => {
                object_suggestions(&trigger.partial, tables)
            }
            SuggestionState::CommandSuggestOpen { trigger, .. } => {
                command_suggestions(&trigger.partial)
            }
        }
    }

    /// Accept `value` for the open trigger; always returns to idle
    pub fn select(&mut self, text: &str, value: &str) -> Option<Edit> {
        let edit = self
            .state
            .trigger()
            .map(|trigger| apply_selection(text, trigger, value));
        self.close();
        edit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Vec<TableMetadata> {
        vec![
            TableMetadata::new("users", &[("id", "integer"), ("email", "text")]),
            TableMetadata::new("orders", &[("id", "integer"), ("user_id", "integer")]),
        ]
    }

    fn values(suggestions: &[Suggestion]) -> Vec<String> {
        suggestions.iter().map(Suggestion::value).collect()
    }

    fn controller() -> SuggestionController<MonospaceMeasure> {
        SuggestionController::new(
            MonospaceMeasure::default(),
            InputGeometry {
                right: 400.0,
                ..Default::default()
            },
            300.0,
        )
    }

    #[test]
    fn test_object_suggestions() {
        let tables = tables();
        assert_eq!(values(&object_suggestions("U", &tables)), vec!["users", "orders.user_id"]);
        assert_eq!(
            values(&object_suggestions("orders.", &tables)),
            vec!["orders.id", "orders.user_id"]
        );
        assert_eq!(values(&object_suggestions("users.e", &tables)), vec!["users.email"]);
        assert!(object_suggestions("nope", &tables).is_empty());
        // empty partial lists everything
        assert_eq!(object_suggestions("", &tables).len(), 6);
    }

    #[test]
    fn test_command_suggestions_search_all_fields() {
        assert_eq!(values(&command_suggestions("")).len(), COMMANDS.len());
        assert_eq!(values(&command_suggestions("tables")), vec!["findTables"]);
        assert_eq!(values(&command_suggestions("my code")), vec!["prettify", "optimize"]);
        assert_eq!(values(&command_suggestions("SCRATCH")), vec!["scratchpad"]);
    }

    #[test]
    fn test_state_transitions() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.on_input("find @u", 7),
            SuggestionState::ObjectSuggestOpen { .. }
        ));
        assert_eq!(ctl.state().anchor().unwrap().left, 7.0);

        assert!(matches!(
            ctl.on_input("/", 1),
            SuggestionState::CommandSuggestOpen { .. }
        ));
        assert_eq!(ctl.suggestions(&tables()).len(), COMMANDS.len());

        ctl.on_escape();
        assert!(!ctl.is_open());
        assert!(ctl.suggestions(&tables()).is_empty());

        ctl.on_input("find @u", 7);
        ctl.on_input("find @u ", 8);
        assert_eq!(ctl.state(), &SuggestionState::Idle);
    }

    #[test]
    fn test_select_replaces_token() {
        let mut ctl = controller();
        ctl.on_input("find @use", 9);
        assert_eq!(
            values(&ctl.suggestions(&tables())),
            vec!["users", "orders.user_id"]
        );

        let edit = ctl.select("find @use", "users").unwrap();
        assert_eq!(edit.text, "find @users ");
        assert_eq!(edit.cursor, 12);
        assert!(!ctl.is_open());
        assert!(ctl.select("find @users ", "users").is_none());
    }
}
