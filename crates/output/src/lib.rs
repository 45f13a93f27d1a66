use std::collections::BTreeSet;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    /// One value per line, for piping into other tools.
    Quiet,
}

/// Columns shown first when present; the rest follow alphabetically.
const LEADING_COLUMNS: &[&str] = &["key", "name", "number", "state"];

pub struct OutputRenderer {
    format: OutputFormat,
    colorize: bool,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn without_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render_to_string(value)?);
        Ok(())
    }

    pub fn render_to_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let value = serde_json::to_value(value)?;

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&value)?.trim_end().to_string(),
            OutputFormat::Table => match self.table(&value) {
                Some(table) => table,
                None => Self::lines(&value)
                    .map(Ok)
                    .unwrap_or_else(|| serde_json::to_string_pretty(&value))?,
            },
            OutputFormat::Quiet => match Self::lines(&value) {
                Some(lines) => lines,
                None => Self::identifiers(&value)
                    .map(Ok)
                    .unwrap_or_else(|| serde_json::to_string_pretty(&value))?,
            },
        };

        Ok(rendered)
    }

    /// Arrays of objects become a table.
    fn table(&self, value: &Value) -> Option<String> {
        let rows = match value {
            Value::Array(rows) if !rows.is_empty() => rows,
            _ => return None,
        };

        let mut keys = BTreeSet::new();
        for row in rows {
            if let Value::Object(obj) = row {
                keys.extend(obj.keys().cloned());
            }
        }
        if keys.is_empty() {
            return None;
        }

        let mut headers: Vec<String> = LEADING_COLUMNS
            .iter()
            .filter(|column| keys.contains(**column))
            .map(|column| column.to_string())
            .collect();
        headers.extend(
            keys.into_iter()
                .filter(|key| !LEADING_COLUMNS.contains(&key.as_str())),
        );

        let mut builder = Builder::default();
        builder.push_record(headers.clone());
        for row in rows {
            let record: Vec<String> = headers
                .iter()
                .map(|header| {
                    let cell = row.get(header).map(value_to_string).unwrap_or_default();
                    if header == "state" {
                        self.paint_state(&cell)
                    } else {
                        cell
                    }
                })
                .collect();
            builder.push_record(record);
        }

        Some(builder.build().with(Style::rounded()).to_string())
    }

    /// Scalars and arrays of scalars, one per line.
    fn lines(value: &Value) -> Option<String> {
        match value {
            Value::Array(items) if items.iter().all(|item| !item.is_object() && !item.is_array()) => {
                Some(
                    items
                        .iter()
                        .map(value_to_string)
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            }
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value_to_string(value)),
            _ => None,
        }
    }

    /// The `key` (or `number`) of each object.
    fn identifiers(value: &Value) -> Option<String> {
        let pick = |obj: &Value| {
            obj.get("key")
                .or_else(|| obj.get("number"))
                .map(value_to_string)
        };

        match value {
            Value::Array(rows) => Some(rows.iter().filter_map(pick).collect::<Vec<_>>().join("\n")),
            Value::Object(_) => pick(value),
            _ => None,
        }
    }

    fn paint_state(&self, state: &str) -> String {
        if !self.colorize {
            return state.to_string();
        }

        match state {
            "Successful" => state.green().to_string(),
            "Failed" => state.red().to_string(),
            _ => state.yellow().to_string(),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
