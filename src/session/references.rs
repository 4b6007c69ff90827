use regex::Regex;
use std::sync::OnceLock;

use crate::backend::{TableHint, TableMetadata};

/// An `@table` or `@table.column` mention inside a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub table: String,
    pub column: Option<String>,
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\w+)(?:\.(\w+))?").expect("static regex"))
}

/// All references in order of appearance, repeats included
pub fn extract_references(text: &str) -> Vec<TableReference> {
    reference_re()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(TableReference {
                table: caps.get(1)?.as_str().to_string(),
                column: caps.get(2).map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

/// One hint per reference: the named column, or every known column of the table
pub fn table_hints(references: &[TableReference], metadata: &[TableMetadata]) -> Vec<TableHint> {
    references
        .iter()
        .map(|r| TableHint {
            name: r.table.clone(),
            columns: match &r.column {
                Some(column) => vec![column.clone()],
                None => metadata
                    .iter()
                    .find(|t| t.name == r.table)
                    .map(TableMetadata::column_names)
                    .unwrap_or_default(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_references() {
        let refs = extract_references("join @orders.customer_id with @customers, not me@");
        assert_eq!(
            refs,
            vec![
                TableReference {
                    table: "orders".to_string(),
                    column: Some("customer_id".to_string()),
                },
                TableReference {
                    table: "customers".to_string(),
                    column: None,
                },
            ]
        );
        assert!(extract_references("plain text").is_empty());
    }

    #[test]
    fn test_hints_expand_bare_tables() {
        let metadata = vec![TableMetadata::new(
            "orders",
            &[("id", "integer"), ("total", "numeric")],
        )];
        let refs = extract_references("@orders @orders.total @ghost");
        let hints = table_hints(&refs, &metadata);

        assert_eq!(hints[0].columns, vec!["id", "total"]);
        assert_eq!(hints[1].columns, vec!["total"]);
        assert_eq!(hints[2].name, "ghost");
        assert!(hints[2].columns.is_empty());
    }
}
