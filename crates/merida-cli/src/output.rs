//! Output formatting utilities.

use std::io::Write;

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;
use crate::{CliError, CliResult};

enum Stream {
    Out,
    Err,
}

fn status(symbol: colored::ColoredString, message: &str, stream: Stream) {
    match stream {
        Stream::Out => println!("{symbol} {message}"),
        Stream::Err => eprintln!("{symbol} {message}"),
    }
}

/// Prints a success message.
pub fn success(message: &str) {
    status("✓".green().bold(), message, Stream::Out);
}

/// Prints an error message.
pub fn error(message: &str) {
    status("✗".red().bold(), message, Stream::Err);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    status("!".yellow().bold(), message, Stream::Err);
}

/// Prints an info message.
pub fn info(message: &str) {
    status("·".blue().bold(), message, Stream::Out);
}

/// Outputs rows in the specified format.
///
/// `id` picks the identifier printed in quiet mode.
pub fn output<T, F>(data: &[T], format: OutputFormat, id: F) -> CliResult<()>
where
    T: Tabled + serde::Serialize,
    F: Fn(&T) -> &str,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{json}");
        }
        OutputFormat::Quiet => {
            for item in data {
                println!("{}", id(item));
            }
        }
    }
    Ok(())
}

/// Outputs a single record.
///
/// Tables show it as indented `field: value` lines; quiet mode prints
/// nothing.
pub fn output_single<T: serde::Serialize>(item: &T, format: OutputFormat) -> CliResult<()> {
    let value = serde_json::to_value(item)?;
    match format {
        OutputFormat::Table => print!("{}", render_fields(&value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn render_fields(value: &serde_json::Value) -> String {
    let mut out = String::new();
    push_fields(&mut out, value, 0);
    out
}

fn push_fields(out: &mut String, value: &serde_json::Value, depth: usize) {
    use serde_json::Value;

    let pad = "  ".repeat(depth);
    match value {
        Value::Object(fields) => {
            for (name, field) in fields {
                if matches!(field, Value::Object(_) | Value::Array(_)) {
                    out.push_str(&format!("{pad}{}:\n", name.bold()));
                    push_fields(out, field, depth + 1);
                } else {
                    out.push_str(&format!("{pad}{}: {}\n", name.bold(), scalar(field)));
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                if entry.is_object() {
                    out.push_str(&format!("{pad}-\n"));
                    push_fields(out, entry, depth + 1);
                } else {
                    out.push_str(&format!("{pad}- {}\n", scalar(entry)));
                }
            }
        }
        other => out.push_str(&format!("{pad}{}\n", scalar(other))),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders an optional cell.
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Asks a yes/no question; anything but `y` or `yes` is a no.
pub fn confirm(message: &str) -> CliResult<bool> {
    let answer = prompt_line(&format!("{message} [y/N]: "))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Prompts for password input (hidden).
pub fn prompt_password(prompt: &str) -> CliResult<String> {
    rpassword::prompt_password(prompt).map_err(CliError::Io)
}

/// Prompts for a line of visible input.
pub fn prompt_line(prompt: &str) -> CliResult<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    if std::io::stdin().read_line(&mut input)? == 0 {
        return Err(CliError::Cancelled);
    }
    Ok(input.trim().to_string())
}
