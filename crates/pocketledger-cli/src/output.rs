//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

use pocketledger_core::models::{Transaction, TransactionType};
use pocketledger_core::utils::{format_currency, format_date, truncate_string};

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => println!("{}", json!({"status": "success", "message": message})),
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => eprintln!("{}", json!({"status": "error", "message": message})),
    }
}

/// Print a notice on stderr, whatever the format.
pub fn print_notice(message: &str) {
    eprintln!("{}", message);
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(72));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

pub fn print_transaction_table(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions found");
        return;
    }
    println!(
        "{:<24} {:<13} {:<8} {:<16} {:>12}  {}",
        "ID", "Date", "Type", "Category", "Amount", "Description"
    );
    print_divider();
    for t in transactions {
        println!(
            "{:<24} {:<13} {:<8} {:<16} {:>12}  {}",
            truncate_string(&t.id, 24),
            format_date(&t.date),
            t.kind,
            truncate_string(&t.category, 16),
            format_currency(t.signed_amount()),
            truncate_string(t.description.as_deref().unwrap_or(""), 30),
        );
    }
}

pub fn type_label(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "Income",
        TransactionType::Expense => "Expense",
    }
}
