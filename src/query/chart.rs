use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::backend::Row;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            other => Err(format!("Unknown chart type: {}", other)),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub x_axis: String,
    pub y_axis: String,
}

/// Finite numbers and strings that parse entirely as one
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Column names in result order, taken from the first row
pub fn columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Columns whose first-row value is numeric
pub fn numeric_columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| {
            row.iter()
                .filter(|(_, v)| as_number(v).is_some())
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// x = first column, y = first numeric column
pub fn default_axes(rows: &[Row]) -> Option<ChartConfig> {
    let y_axis = numeric_columns(rows).into_iter().next()?;
    let x_axis = columns(rows).into_iter().next()?;
    Some(ChartConfig { x_axis, y_axis })
}

/// (label, value) pairs for plotting; rows without a numeric y are skipped
pub fn series(rows: &[Row], config: &ChartConfig) -> Vec<(String, f64)> {
    rows.iter()
        .filter_map(|row| {
            let y = as_number(row.get(&config.y_axis)?)?;
            let label = match row.get(&config.x_axis) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Some((label, y))
        })
        .collect()
}
