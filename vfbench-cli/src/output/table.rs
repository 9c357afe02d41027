//! Table output formatting using the `tabled` crate

use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment, Modify},
};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Create a simple table from rows of strings
    pub fn from_rows(headers: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().copied());
        for row in rows {
            builder.push_record(row.iter().map(|s| s.as_str()));
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Format a simple key-value table
    pub fn format_key_value(pairs: &[(&str, String)]) -> String {
        let mut builder = Builder::default();
        for (key, value) in pairs {
            builder.push_record([*key, value.as_str()]);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.with(Modify::new(Columns::first()).with(Alignment::right()));
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let headers = vec!["Size", "Labels"];
        let rows = vec![
            vec!["8".to_string(), "label_4".to_string()],
            vec!["16".to_string(), "label_8".to_string()],
        ];

        let output = TableOutput::from_rows(&headers, &rows);
        assert!(output.contains("Size"));
        assert!(output.contains("label_8"));
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(TableOutput::from_rows(&["A"], &[]), "(no results)");
    }

    #[test]
    fn test_key_value_table() {
        let pairs = vec![("Nodes", "3".to_string()), ("Edges", "2".to_string())];
        let output = TableOutput::format_key_value(&pairs);
        assert!(output.contains("Nodes"));
        assert!(output.contains('3'));
    }
}
