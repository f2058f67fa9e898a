//! Statistics and dashboard commands.

use anyhow::Result;
use chrono::{Local, NaiveDate};

use pocketledger_core::dashboard::{Dashboard, MonthlyTrend, Period};
use pocketledger_core::models::{CategoryTotal, Statistics, TransactionFilters, TransactionType};
use pocketledger_core::utils::format_currency;

use super::Context;
use crate::output::{self, OutputFormat};

/// Width of the longest trend bar
const BAR_WIDTH: usize = 30;

/// Explicit dates win over the period, which defaults to this month
pub fn resolve_filters(period: Option<Period>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> TransactionFilters {
    let today = Local::now().date_naive();
    if from.is_some() || to.is_some() {
        return TransactionFilters {
            start_date: from,
            end_date: to,
            ..TransactionFilters::default()
        };
    }
    period.unwrap_or_default().filters(today)
}

fn print_statistics(stats: &Statistics) {
    output::print_row(
        "Income",
        &format!("{} ({} transactions)", format_currency(stats.income.total), stats.income.count),
    );
    output::print_row(
        "Expenses",
        &format!("{} ({} transactions)", format_currency(stats.expense.total), stats.expense.count),
    );
    let verdict = if stats.balance >= 0.0 { "Surplus" } else { "Deficit" };
    output::print_row("Balance", &format!("{} {}", format_currency(stats.balance), verdict));
    if let Some(rate) = stats.savings_rate() {
        output::print_row("Savings rate", &format!("{:.1}%", rate));
    }
}

fn print_breakdown(rows: &[&CategoryTotal], total: f64) {
    if rows.is_empty() {
        println!("  No data for this period");
    }
    for row in rows {
        let share = if total > 0.0 { row.total / total * 100.0 } else { 0.0 };
        println!(
            "  {:<20} {:>12} {:>6.1}%  {} transaction(s)",
            row.category,
            format_currency(row.total),
            share,
            row.count
        );
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(width.max(1))
}

fn print_trends(trends: &[MonthlyTrend]) {
    let max = trends
        .iter()
        .map(|t| t.income.max(t.expense))
        .fold(0.0_f64, f64::max);
    for trend in trends {
        println!(
            "  {:<7} in  {:>12} {}",
            trend.label,
            format_currency(trend.income),
            bar(trend.income, max)
        );
        println!("  {:<7} out {:>12} {}", "", format_currency(trend.expense), bar(trend.expense, max));
    }
}

pub async fn stats(ctx: &Context, filters: TransactionFilters) -> Result<()> {
    ctx.require_login()?;
    let mut store = ctx.data_store();
    let stats = store.load_statistics(&filters).await?;

    match ctx.format {
        OutputFormat::Text => print_statistics(&stats),
        OutputFormat::Json => output::print_json(&stats)?,
    }
    Ok(())
}

pub async fn breakdown(ctx: &Context, kind: TransactionType, filters: TransactionFilters) -> Result<()> {
    ctx.require_login()?;
    let mut store = ctx.data_store();
    let rows = store.get_category_breakdown(kind, &filters).await?;

    match ctx.format {
        OutputFormat::Text => {
            let total: f64 = rows.iter().map(|r| r.total).sum();
            output::print_heading(&format!("{} by category", output::type_label(kind)));
            print_breakdown(&rows.iter().collect::<Vec<_>>(), total);
        }
        OutputFormat::Json => output::print_json(&rows)?,
    }
    Ok(())
}

pub async fn dashboard(ctx: &Context, period: Period) -> Result<()> {
    ctx.require_login()?;
    let today = Local::now().date_naive();
    let dashboard = Dashboard::load(&ctx.client, period, today).await?;

    match ctx.format {
        OutputFormat::Text => {
            let (start, end) = period.range(today);
            output::print_heading(&format!("Overview {} to {}", start, end));
            print_statistics(&dashboard.statistics);

            output::print_heading("Income vs expenses");
            for (label, value) in dashboard.balance_series() {
                output::print_row(label, &format_currency(value));
            }

            output::print_heading("Top expense categories");
            print_breakdown(&dashboard.top_expense_categories(), dashboard.statistics.expense.total);

            output::print_heading("Recent transactions");
            output::print_transaction_table(&dashboard.recent_transactions);

            output::print_heading("Monthly trends");
            print_trends(&dashboard.trends);
        }
        OutputFormat::Json => output::print_json(&dashboard)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dates_override_period() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let filters = resolve_filters(Some(Period::Year), Some(from), None);
        assert_eq!(filters.start_date, Some(from));
        assert_eq!(filters.end_date, None);
    }

    #[test]
    fn test_default_period_is_this_month() {
        let filters = resolve_filters(None, None, None);
        let today = Local::now().date_naive();
        assert_eq!(filters.end_date, Some(today));
        assert_eq!(filters.start_date, Some(Period::Month.range(today).0));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0.0, 100.0), "");
        assert_eq!(bar(100.0, 100.0).len(), BAR_WIDTH);
        assert_eq!(bar(0.1, 100.0), "#");
    }
}
