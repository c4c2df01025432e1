//! Output formatters for split and explain results.

use clap::ValueEnum;
use comfy_table::Table;

use crate::explain::Explanation;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the concrete queries of a split.
    fn format_split(&self, query: &str, concrete: &[String]) -> String;

    /// Format a plan explanation.
    fn format_explanation(&self, explanation: &Explanation) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_split(&self, query: &str, concrete: &[String]) -> String {
        if concrete.is_empty() {
            return format!("No persistent classes found for query: {}", query);
        }

        let mut table = Table::new();
        table.set_header(vec!["#", "Concrete query"]);
        for (i, q) in concrete.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), q.clone()]);
        }
        table.to_string()
    }

    fn format_explanation(&self, explanation: &Explanation) -> String {
        let mut summary = Table::new();
        summary.set_header(vec!["Property", "Value"]);
        summary.add_row(vec!["Query".to_string(), explanation.query.clone()]);
        if let Some(role) = &explanation.collection_role {
            summary.add_row(vec!["Collection role".to_string(), role.clone()]);
        }
        summary.add_row(vec!["Kind".to_string(), explanation.kind.to_string()]);
        summary.add_row(vec!["Shallow".to_string(), explanation.shallow.to_string()]);
        summary.add_row(vec![
            "Query spaces".to_string(),
            join_or_dash(&explanation.query_spaces),
        ]);
        summary.add_row(vec![
            "Enabled filters".to_string(),
            join_or_dash(&explanation.enabled_filters),
        ]);
        if let Some(aliases) = &explanation.return_aliases {
            summary.add_row(vec!["Return aliases".to_string(), join_or_dash(aliases)]);
        }

        let mut output = summary.to_string();

        let mut queries = Table::new();
        queries.set_header(vec!["#", "Concrete query", "SQL"]);
        for (i, query) in explanation.concrete_queries.iter().enumerate() {
            let sql = explanation.sql.get(i).cloned().unwrap_or_default();
            queries.add_row(vec![(i + 1).to_string(), query.clone(), sql]);
        }
        output.push_str("\n\n");
        if explanation.concrete_queries.is_empty() {
            output.push_str("No persistent classes found");
        } else {
            output.push_str(&queries.to_string());
        }

        if !explanation.parameters.is_empty() {
            let mut params = Table::new();
            params.set_header(vec!["Parameter", "Expected type", "Locations"]);
            for p in &explanation.parameters {
                let locations: Vec<String> = p.locations.iter().map(ToString::to_string).collect();
                params.add_row(vec![
                    p.name.clone(),
                    p.expected_type.clone().unwrap_or_else(|| "-".to_string()),
                    locations.join(", "),
                ]);
            }
            output.push_str("\n\n");
            output.push_str(&params.to_string());
        }

        output
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_split(&self, query: &str, concrete: &[String]) -> String {
        serde_json::to_string_pretty(&serde_json::json!({
            "query": query,
            "concrete_queries": concrete,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_explanation(&self, explanation: &Explanation) -> String {
        serde_json::to_string_pretty(explanation).unwrap_or_else(|_| "{}".to_string())
    }
}
