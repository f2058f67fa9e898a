use serde::{Deserialize, Serialize};

/// Totals for one category. Used both inside [`Statistics`] and as the row
/// type of `/transactions/categories/:type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryTotal {
    #[serde(rename = "_id", alias = "category", default)]
    pub category: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub count: u32,
}

pub type CategoryBreakdown = Vec<CategoryTotal>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TypeSummary {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub categories: Vec<CategoryTotal>,
}

/// Aggregates from `/transactions/statistics`. The default value is the
/// zeroed state shown before anything is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Statistics {
    #[serde(default)]
    pub income: TypeSummary,
    #[serde(default)]
    pub expense: TypeSummary,
    #[serde(default)]
    pub balance: f64,
}

impl Statistics {
    /// Share of income left after expenses, in percent. None without income.
    pub fn savings_rate(&self) -> Option<f64> {
        if self.income.total <= 0.0 {
            return None;
        }
        Some((self.income.total - self.expense.total) / self.income.total * 100.0)
    }
}
