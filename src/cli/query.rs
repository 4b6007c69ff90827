//! Query commands

use anyhow::{bail, Result};
use serde_json::Value;

use crate::app::App;
use crate::backend::Row;
use crate::query::chart::{self, ChartConfig, ChartType};

const CELL_WIDTH: usize = 18;
const BAR_WIDTH: f64 = 40.0;

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > CELL_WIDTH {
        let prefix: String = text.chars().take(CELL_WIDTH - 3).collect();
        format!("{}...", prefix)
    } else {
        text
    }
}

fn print_rows(rows: &[Row]) {
    let columns = chart::columns(rows);
    let header: Vec<String> = columns
        .iter()
        .map(|c| format!("{:<width$}", c, width = CELL_WIDTH))
        .collect();
    println!("{}", header.join(" "));
    println!("{}", "-".repeat((CELL_WIDTH + 1) * columns.len()));

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|c| {
                let value = row.get(c).map(cell).unwrap_or_default();
                format!("{:<width$}", value, width = CELL_WIDTH)
            })
            .collect();
        println!("{}", line.join(" "));
    }
    println!("({} rows)", rows.len());
}

pub async fn run(app: &mut App, text: &str) -> Result<()> {
    let query = app.run_query(text).await?;
    println!("{} [{}]", query.title, query.id);
    if let Some(rows) = &query.results {
        print_rows(rows);
    }
    Ok(())
}

pub fn create(app: &mut App) -> Result<()> {
    let query = app.queries_mut().create_query()?;
    println!("Opened {} [{}]", query.title, query.id);
    Ok(())
}

pub fn list(app: &App) -> Result<()> {
    let tabs = app.queries();
    if tabs.queries().is_empty() {
        println!("No query tabs. Run 't2sql query run' first.");
        return Ok(());
    }

    let active = tabs.active().map(|q| q.id.clone());
    println!("{:<2} {:<15} {:<12} {:<32} {}", "", "ID", "Created", "Title", "Rows");
    println!("{}", "-".repeat(70));
    for query in tabs.queries() {
        let marker = if active.as_deref() == Some(query.id.as_str()) {
            "*"
        } else {
            ""
        };
        let rows = query
            .results
            .as_ref()
            .map(|r| r.len().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<2} {:<15} {:<12} {:<32} {}",
            marker,
            query.id,
            query.created_at.format("%m-%d %H:%M"),
            query.title,
            rows
        );
    }
    Ok(())
}

pub fn open(app: &mut App, id: &str) -> Result<()> {
    let query = app.queries_mut().load_query(id)?;
    println!("{} [{}]", query.title, query.id);
    println!("{}", query.content);
    if let Some(rows) = &query.results {
        println!();
        print_rows(rows);
    }
    Ok(())
}

pub fn delete(app: &mut App, id: &str) -> Result<()> {
    if !app.queries_mut().delete_query(id)? {
        bail!("Query not found: {}", id);
    }
    println!("Deleted query {}", id);
    Ok(())
}

/// Plot the active tab's results as text
pub fn chart(
    app: &App,
    chart_type: ChartType,
    x_axis: Option<String>,
    y_axis: Option<String>,
) -> Result<()> {
    let Some(rows) = app.queries().results() else {
        bail!("No results to chart. Run or open a query first.");
    };
    let Some(defaults) = chart::default_axes(rows) else {
        bail!("Results have no numeric column to chart.");
    };
    let config = ChartConfig {
        x_axis: x_axis.unwrap_or(defaults.x_axis),
        y_axis: y_axis.unwrap_or(defaults.y_axis),
    };

    let series = chart::series(rows, &config);
    if series.is_empty() {
        bail!("Column '{}' has no numeric values.", config.y_axis);
    }

    println!("{} chart: {} by {}", chart_type, config.y_axis, config.x_axis);
    match chart_type {
        ChartType::Pie => {
            let total: f64 = series.iter().map(|(_, v)| v.abs()).sum();
            for (label, value) in &series {
                let share = if total > 0.0 { value.abs() / total * 100.0 } else { 0.0 };
                println!("{:<20} {:>6.1}%  {}", label, share, value);
            }
        }
        ChartType::Bar | ChartType::Line => {
            let max = series.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
            let glyph = if chart_type == ChartType::Bar { "#" } else { "*" };
            for (label, value) in &series {
                let len = if max > 0.0 {
                    (value.abs() / max * BAR_WIDTH).round() as usize
                } else {
                    0
                };
                println!("{:<20} {:<40} {}", label, glyph.repeat(len), value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell(&Value::Null), "NULL");
        assert_eq!(cell(&json!("north")), "north");
        assert_eq!(cell(&json!(12.5)), "12.5");
        assert_eq!(cell(&json!("a very long street address line")), "a very long str...");
    }
}
