//! Category commands.

use anyhow::Result;
use serde_json::json;

use pocketledger_core::models::{
    categories_of_kind, Category, CategoryInput, TransactionType, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON,
};
use pocketledger_core::validation::{validate_category, CategoryForm};

use super::{confirm, Context};
use crate::output::{self, OutputFormat};

fn print_group(kind: TransactionType, categories: &[Category]) {
    let group = categories_of_kind(categories, kind);
    output::print_heading(&format!("{} Categories ({})", output::type_label(kind), group.len()));
    if group.is_empty() {
        println!("  No categories yet");
    }
    for category in group {
        println!(
            "  {:<28} {:<9} {}{}",
            category.label(),
            category.color.as_deref().unwrap_or("-"),
            category.id,
            if category.is_default { "  (default)" } else { "" },
        );
    }
}

pub async fn categories_list(ctx: &Context, kind: Option<TransactionType>) -> Result<()> {
    ctx.require_login()?;
    let mut store = ctx.data_store();
    let categories = store.load_categories(kind).await?;

    match ctx.format {
        OutputFormat::Text => match kind {
            Some(kind) => print_group(kind, &categories),
            None => {
                print_group(TransactionType::Income, &categories);
                print_group(TransactionType::Expense, &categories);
            }
        },
        OutputFormat::Json => output::print_json(&categories)?,
    }
    Ok(())
}

pub async fn categories_add(
    ctx: &Context,
    name: String,
    kind: TransactionType,
    color: Option<String>,
    icon: Option<String>,
) -> Result<()> {
    ctx.require_login()?;
    let input = validate_category(&CategoryForm {
        name,
        kind,
        color: color.unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        icon: icon.unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
    })?;

    let mut store = ctx.data_store();
    let created = store.create_category(&input).await?;

    match ctx.format {
        OutputFormat::Text => output::print_success(
            &format!("Added {} category {} {}", kind, input.icon, input.name),
            &ctx.format,
        ),
        OutputFormat::Json => output::print_json(&json!({"status": "success", "category": created}))?,
    }
    Ok(())
}

pub async fn categories_edit(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    color: Option<String>,
    icon: Option<String>,
) -> Result<()> {
    ctx.require_login()?;
    let existing: Category = ctx
        .client
        .get_category(id)
        .await
        .into_result()?
        .field("category")?;
    let base = CategoryInput::from_category(&existing);
    let input = validate_category(&CategoryForm {
        name: name.unwrap_or(base.name),
        kind: base.kind,
        color: color.unwrap_or(base.color),
        icon: icon.unwrap_or(base.icon),
    })?;

    let mut store = ctx.data_store();
    store.update_category(id, &input).await?;
    output::print_success(&format!("Category {} updated", input.name), &ctx.format);
    Ok(())
}

pub async fn categories_delete(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    ctx.require_login()?;
    if !confirm(&format!("Delete category {}?", id), yes)? {
        output::print_success("Cancelled", &ctx.format);
        return Ok(());
    }
    let mut store = ctx.data_store();
    store.delete_category(id).await?;
    output::print_success(&format!("Category {} deleted", id), &ctx.format);
    Ok(())
}
