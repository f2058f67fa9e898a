//! Transaction commands.

use anyhow::Result;
use chrono::Local;
use clap::Args;
use serde_json::json;

use pocketledger_core::models::{Transaction, TransactionFilters, TransactionInput, TransactionType};
use pocketledger_core::utils::{format_currency, format_date};
use pocketledger_core::validation::{validate_transaction, TransactionForm};
use pocketledger_core::ApiError;

use super::{confirm, Context};
use crate::output::{self, OutputFormat};

/// Transaction fields given on the command line.
#[derive(Args, Debug, Default, Clone)]
pub struct TransactionArgs {
    /// income or expense
    #[arg(short = 't', long = "type")]
    pub kind: Option<TransactionType>,

    /// Positive amount, e.g. 12.50
    #[arg(short, long, allow_hyphen_values = true)]
    pub amount: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(long)]
    pub subcategory: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// YYYY-MM-DD (defaults to today when adding)
    #[arg(long)]
    pub date: Option<String>,
}

impl TransactionArgs {
    /// Overlay these fields on `base`
    fn onto(self, base: TransactionForm) -> TransactionForm {
        TransactionForm {
            kind: self.kind.unwrap_or(base.kind),
            amount: self.amount.unwrap_or(base.amount),
            category: self.category.unwrap_or(base.category),
            subcategory: self.subcategory.unwrap_or(base.subcategory),
            description: self.description.unwrap_or(base.description),
            date: self.date.unwrap_or(base.date),
        }
    }
}

fn form_from(input: &TransactionInput) -> TransactionForm {
    TransactionForm {
        kind: input.kind,
        amount: input.amount.to_string(),
        category: input.category.clone(),
        subcategory: input.subcategory.clone(),
        description: input.description.clone(),
        date: input.date.format("%Y-%m-%d").to_string(),
    }
}

/// List transactions, optionally filtered server-side and searched locally.
pub async fn transactions_list(
    ctx: &Context,
    filters: TransactionFilters,
    search: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    ctx.require_login()?;
    let mut store = ctx.data_store();

    let result = store.load_transactions(&filters).await;
    let transactions = match result {
        Ok(transactions) => transactions,
        Err(ApiError::Network(message)) if filters.is_empty() => {
            if !store.restore_cached() {
                anyhow::bail!("{}", message);
            }
            let age = store
                .cache()
                .and_then(|cache| cache.get_cache_ages().transactions)
                .unwrap_or_else(|| "unknown".to_string());
            output::print_notice(&format!("Offline: showing transactions cached {}", age));
            store.transactions().to_vec()
        }
        Err(e) => return Err(e.into()),
    };

    let term = search.unwrap_or_default();
    let matching: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| t.matches_search(&term))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    match ctx.format {
        OutputFormat::Text => {
            output::print_transaction_table(&matching);
            if !matching.is_empty() {
                let net: f64 = matching.iter().map(Transaction::signed_amount).sum();
                println!("\n{} transaction(s), net {}", matching.len(), format_currency(net));
            }
        }
        OutputFormat::Json => output::print_json(&matching)?,
    }
    Ok(())
}

async fn fetch_transaction(ctx: &Context, id: &str) -> Result<Transaction> {
    let transaction = ctx
        .client
        .get_transaction(id)
        .await
        .into_result()?
        .field("transaction")?;
    Ok(transaction)
}

pub async fn transactions_show(ctx: &Context, id: &str) -> Result<()> {
    ctx.require_login()?;
    let transaction = fetch_transaction(ctx, id).await?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("ID", &transaction.id);
            output::print_row("Type", output::type_label(transaction.kind));
            output::print_row("Amount", &format_currency(transaction.amount));
            output::print_row("Category", &transaction.category);
            if let Some(ref subcategory) = transaction.subcategory {
                output::print_row("Subcategory", subcategory);
            }
            if let Some(ref description) = transaction.description {
                output::print_row("Description", description);
            }
            output::print_row("Date", &format_date(&transaction.date));
        }
        OutputFormat::Json => output::print_json(&transaction)?,
    }
    Ok(())
}

pub async fn transactions_add(ctx: &Context, args: TransactionArgs) -> Result<()> {
    ctx.require_login()?;
    let form = args.onto(TransactionForm {
        date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
        ..TransactionForm::default()
    });
    let input = validate_transaction(&form)?;

    let mut store = ctx.data_store();
    let created = store.create_transaction(&input).await?;

    match ctx.format {
        OutputFormat::Text => {
            let id = created.as_ref().map(|t| t.id.as_str()).unwrap_or("-");
            output::print_success(
                &format!(
                    "Added {} of {} in {} ({})",
                    input.kind,
                    format_currency(input.amount),
                    input.category,
                    id
                ),
                &ctx.format,
            );
        }
        OutputFormat::Json => output::print_json(&json!({"status": "success", "transaction": created}))?,
    }
    Ok(())
}

pub async fn transactions_edit(ctx: &Context, id: &str, args: TransactionArgs) -> Result<()> {
    ctx.require_login()?;
    let existing = fetch_transaction(ctx, id).await?;
    let base = TransactionInput::from_transaction(&existing)
        .ok_or_else(|| anyhow::anyhow!("Transaction {} has an unreadable date: {}", id, existing.date))?;
    let input = validate_transaction(&args.onto(form_from(&base)))?;

    let mut store = ctx.data_store();
    store.update_transaction(id, &input).await?;
    output::print_success(&format!("Transaction {} updated", id), &ctx.format);
    Ok(())
}

pub async fn transactions_delete(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    ctx.require_login()?;
    if !confirm(&format!("Delete transaction {}?", id), yes)? {
        output::print_success("Cancelled", &ctx.format);
        return Ok(());
    }
    let mut store = ctx.data_store();
    store.delete_transaction(id).await?;
    output::print_success(&format!("Transaction {} deleted", id), &ctx.format);
    Ok(())
}
