//! Dashboard figures: period totals, category breakdowns, recent activity
//! and twelve months of income/expense trends.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::models::{
    CategoryBreakdown, CategoryTotal, Statistics, Transaction, TransactionFilters, TransactionType,
};

/// How many transactions the dashboard lists
pub const RECENT_TRANSACTIONS: usize = 5;

/// How many expense categories the dashboard ranks
pub const TOP_CATEGORIES: usize = 5;

const TREND_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Inclusive range ending `today`: the last 7 days, the month so far or
    /// the year so far.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Period::Week => today - Duration::days(6),
            Period::Month => first_of_month(today),
            Period::Year => today - Duration::days(i64::from(today.ordinal0())),
        };
        (start, today)
    }

    pub fn filters(&self, today: NaiveDate) -> TransactionFilters {
        let (start, end) = self.range(today);
        TransactionFilters::date_range(start, end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(format!("unknown period '{}' (expected week, month or year)", other)),
        }
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

/// One calendar month, labeled like `Mar 24`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The twelve calendar months ending with the one containing `today`,
/// oldest first.
pub fn monthly_windows(today: NaiveDate) -> Vec<MonthWindow> {
    let current = first_of_month(today);
    (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| {
            let start = current.checked_sub_months(Months::new(back))?;
            let end = start.checked_add_months(Months::new(1))? - Duration::days(1);
            Some(MonthWindow {
                label: start.format("%b %y").to_string(),
                start,
                end,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub period: Period,
    pub statistics: Statistics,
    pub income_breakdown: CategoryBreakdown,
    pub expense_breakdown: CategoryBreakdown,
    pub recent_transactions: Vec<Transaction>,
    pub trends: Vec<MonthlyTrend>,
}

impl Dashboard {
    /// Fetch everything the dashboard shows for `period`.
    ///
    /// Period figures are fetched concurrently and any failure is returned.
    /// Monthly trends are fetched concurrently too, but a month that fails
    /// counts as zero.
    pub async fn load(client: &ApiClient, period: Period, today: NaiveDate) -> Result<Self, ApiError> {
        let filters = period.filters(today);
        let (statistics, income, expense, transactions) = tokio::join!(
            client.get_statistics(&filters),
            client.get_category_breakdown(TransactionType::Income, &filters),
            client.get_category_breakdown(TransactionType::Expense, &filters),
            client.get_transactions(&filters),
        );
        let statistics: Statistics = statistics.into_result()?.field("statistics")?;
        let income_breakdown: CategoryBreakdown = income.into_result()?.field("breakdown")?;
        let expense_breakdown: CategoryBreakdown = expense.into_result()?.field("breakdown")?;
        let mut recent_transactions: Vec<Transaction> = transactions.into_result()?.field("transactions")?;
        recent_transactions.truncate(RECENT_TRANSACTIONS);

        let trends = Self::load_trends(client, today).await;

        Ok(Self {
            period,
            statistics,
            income_breakdown,
            expense_breakdown,
            recent_transactions,
            trends,
        })
    }

    async fn load_trends(client: &ApiClient, today: NaiveDate) -> Vec<MonthlyTrend> {
        let windows = monthly_windows(today);
        let totals = join_all(windows.iter().map(|window| async move {
            let filters = TransactionFilters::date_range(window.start, window.end);
            let result = client
                .get_statistics(&filters)
                .await
                .into_result()
                .and_then(|envelope| envelope.field::<Statistics>("statistics"));
            match result {
                Ok(stats) => (stats.income.total, stats.expense.total),
                Err(e) => {
                    warn!(month = %window.label, error = %e, "Failed to load monthly statistics");
                    (0.0, 0.0)
                }
            }
        }))
        .await;

        windows
            .into_iter()
            .zip(totals)
            .map(|(window, (income, expense))| MonthlyTrend {
                label: window.label,
                income,
                expense,
            })
            .collect()
    }

    /// Income against expenses for the period, as chart slices
    pub fn balance_series(&self) -> [(&'static str, f64); 2] {
        [
            ("Income", self.statistics.income.total),
            ("Expenses", self.statistics.expense.total),
        ]
    }

    /// Largest expense categories first
    pub fn top_expense_categories(&self) -> Vec<&CategoryTotal> {
        let mut ranked: Vec<&CategoryTotal> = self.expense_breakdown.iter().collect();
        ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
        ranked.truncate(TOP_CATEGORIES);
        ranked
    }

    /// Share of period expenses spent in `category`, in percent
    pub fn expense_share(&self, category: &CategoryTotal) -> f64 {
        let total = self.statistics.expense.total;
        if total > 0.0 {
            category.total / total * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{json_response, FakeTransport, TestSession};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_period_ranges() {
        let today = day(2024, 3, 15);
        assert_eq!(Period::Week.range(today), (day(2024, 3, 9), today));
        assert_eq!(Period::Month.range(today), (day(2024, 3, 1), today));
        assert_eq!(Period::Year.range(today), (day(2024, 1, 1), today));
        assert_eq!(Period::Week.range(day(2024, 1, 3)).0, day(2023, 12, 28));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Week".parse::<Period>(), Ok(Period::Week));
        assert!("quarter".parse::<Period>().is_err());
        assert_eq!(Period::default().to_string(), "month");
    }

    #[test]
    fn test_monthly_windows_cross_year() {
        let windows = monthly_windows(day(2024, 2, 15));
        assert_eq!(windows.len(), 12);
        assert_eq!(windows[0].label, "Mar 23");
        assert_eq!(windows[0].start, day(2023, 3, 1));
        assert_eq!(windows[0].end, day(2023, 3, 31));
        assert_eq!(windows[11].label, "Feb 24");
        assert_eq!(windows[11].end, day(2024, 2, 29));
    }

    fn stats(income: f64, expense: f64) -> serde_json::Value {
        json!({
            "income": {"total": income, "count": 1, "categories": []},
            "expense": {"total": expense, "count": 1, "categories": []},
            "balance": income - expense
        })
    }

    #[tokio::test]
    async fn test_load_dashboard() {
        let transport = FakeTransport::routed(|request| {
            let query = request.url.query().unwrap_or_default().to_string();
            let body = match request.url.path() {
                "/api/transactions/statistics" if query.contains("startDate=2024-01-01") => {
                    return Ok(json_response(500, json!({"message": "boom"})));
                }
                "/api/transactions/statistics" if query.contains("endDate=2024-03-15") => {
                    json!({"statistics": stats(1000.0, 400.0)})
                }
                "/api/transactions/statistics" => json!({"statistics": stats(100.0, 50.0)}),
                "/api/transactions/categories/income" => {
                    json!({"breakdown": [{"_id": "Salary", "total": 1000.0, "count": 1}]})
                }
                "/api/transactions/categories/expense" => json!({"breakdown": [
                    {"_id": "Rent", "total": 250.0, "count": 1},
                    {"_id": "Food", "total": 100.0, "count": 4},
                    {"_id": "Fun", "total": 20.0, "count": 1},
                    {"_id": "Bus", "total": 10.0, "count": 2},
                    {"_id": "Gym", "total": 15.0, "count": 1},
                    {"_id": "Tea", "total": 5.0, "count": 1}
                ]}),
                "/api/transactions" => {
                    let items: Vec<_> = (0..8)
                        .map(|i| json!({
                            "_id": format!("t{}", i),
                            "type": "expense",
                            "amount": 1.0,
                            "category": "Food",
                            "date": "2024-03-10T00:00:00.000Z"
                        }))
                        .collect();
                    json!({"transactions": items})
                }
                _ => return Ok(json_response(404, json!({"message": "Not found"}))),
            };
            Ok(json_response(200, body))
        });
        let session = TestSession::new(Some("tok"), transport);

        let dashboard = Dashboard::load(&session.client, Period::Month, day(2024, 3, 15))
            .await
            .expect("dashboard loads");

        assert_eq!(dashboard.statistics.balance, 600.0);
        assert_eq!(dashboard.recent_transactions.len(), RECENT_TRANSACTIONS);
        assert_eq!(dashboard.balance_series(), [("Income", 1000.0), ("Expenses", 400.0)]);

        let top: Vec<&str> = dashboard
            .top_expense_categories()
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(top, vec!["Rent", "Food", "Fun", "Gym", "Bus"]);
        assert_eq!(dashboard.expense_share(dashboard.top_expense_categories()[0]), 62.5);

        assert_eq!(dashboard.trends.len(), 12);
        let january = dashboard
            .trends
            .iter()
            .find(|t| t.label == "Jan 24")
            .expect("january present");
        assert_eq!((january.income, january.expense), (0.0, 0.0));
        assert_eq!(dashboard.trends[0].label, "Apr 23");
        assert_eq!(dashboard.trends[0].income, 100.0);

        // 4 period requests plus one per month
        assert_eq!(session.transport.requests().len(), 4 + 12);
    }

    #[tokio::test]
    async fn test_load_dashboard_propagates_period_failure() {
        let transport = FakeTransport::routed(|_| Ok(json_response(500, json!({"message": "down"}))));
        let session = TestSession::new(Some("tok"), transport);
        let err = Dashboard::load(&session.client, Period::Week, day(2024, 3, 15))
            .await
            .expect_err("server down");
        assert_eq!(err, ApiError::ServerError("down".to_string()));
    }
}
