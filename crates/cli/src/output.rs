//! Output formatting and terminal rendering

use colored::Colorize;
use serde_json::Value;

use crate::api::{Slice, SliceConfiguration};

/// Print a section header
pub fn print_header(text: &str) {
    println!();
    println!("{}", format!("▶ {}", text).bright_yellow().bold());
    println!("{}", "─".repeat(60).dimmed());
}

pub fn print_success(text: &str) {
    println!("{} {}", "✓".bright_green(), text.bright_white());
}

pub fn print_error(text: &str) {
    eprintln!("{} {}", "✗".bright_red(), text.bright_red());
}

pub fn print_info(text: &str) {
    println!("{} {}", "ℹ".bright_blue(), text);
}

/// Pretty-print a JSON document, falling back to the raw text
pub fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// One row per slice: uuid, name, device and edge counts
pub fn slice_rows(slices: &[Slice]) -> Vec<String> {
    slices
        .iter()
        .map(|s| {
            format!(
                "{:<38} {:<20} {:>7} {:>6}",
                s.uuid,
                s.name,
                s.devices.len(),
                s.edges.len()
            )
        })
        .collect()
}

pub fn print_slices_table(slices: &[Slice]) {
    println!();
    println!(
        "{}",
        format!("{:<38} {:<20} {:>7} {:>6}", "UUID", "NAME", "DEVICES", "EDGES").bold()
    );
    println!("{}", "─".repeat(74).dimmed());
    for row in slice_rows(slices) {
        println!("{}", row);
    }
    println!();
}

/// Render a configured slice as `a -> b -> c` followed by management addresses
pub fn format_configuration(config: &SliceConfiguration) -> String {
    let mut out = config.path.join(" -> ");
    for device in &config.path {
        if let Some(address) = config.management.get(device) {
            let address = address
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| address.to_string());
            out.push_str(&format!("\n  {:<24} {}", device, address));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_json_falls_back_to_raw() {
        assert_eq!(pretty_json("not json"), "not json");
        assert!(pretty_json(r#"{"a":1}"#).contains("\"a\": 1"));
    }

    #[test]
    fn test_slice_rows() {
        let slices = vec![Slice {
            name: "slice-1".to_string(),
            uuid: "2f1c".to_string(),
            devices: vec![Value::Null, Value::Null],
            edges: vec![Value::Null],
            version: 1,
        }];
        let rows = slice_rows(&slices);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("2f1c"));
        assert!(rows[0].contains("slice-1"));
        assert!(rows[0].trim_end().ends_with('1'));
    }

    #[test]
    fn test_format_configuration() {
        let config: SliceConfiguration = serde_json::from_str(
            r#"{"path":["a","b"],"management":{"a":"10.0.0.1","b":"10.0.0.2"}}"#,
        )
        .unwrap();
        let text = format_configuration(&config);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("a -> b"));
        assert!(lines.next().unwrap().contains("10.0.0.1"));
        assert!(lines.next().unwrap().contains("10.0.0.2"));
    }
}
