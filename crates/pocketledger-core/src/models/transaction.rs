use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::QueryParams;
use crate::utils::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A transaction as returned by `/transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO timestamp as sent by the server
    pub date: String,
}

impl Transaction {
    /// Case-insensitive match against category, subcategory and description.
    /// An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        contains_ignore_case(&self.category, term)
            || self
                .subcategory
                .as_deref()
                .is_some_and(|s| contains_ignore_case(s, term))
            || self
                .description
                .as_deref()
                .is_some_and(|d| contains_ignore_case(d, term))
    }

    /// Amount with sign applied: income positive, expense negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Calendar day of the transaction, if the server date parses
    pub fn day(&self) -> Option<NaiveDate> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.date_naive());
        }
        self.date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

/// Payload for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TransactionInput {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub description: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub date: NaiveDate,
}

impl TransactionInput {
    /// Prefill an edit form from an existing transaction
    pub fn from_transaction(transaction: &Transaction) -> Option<Self> {
        Some(Self {
            kind: transaction.kind,
            amount: transaction.amount,
            category: transaction.category.clone(),
            subcategory: transaction.subcategory.clone().unwrap_or_default(),
            description: transaction.description.clone().unwrap_or_default(),
            date: transaction.day()?,
        })
    }
}

/// Server-side filters for `/transactions`, `/transactions/statistics` and
/// `/transactions/categories/:type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilters {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilters {
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query().is_empty()
    }

    pub fn query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_opt("type", self.kind);
        params.push_opt("category", self.category.as_deref());
        params.push_opt("startDate", self.start_date.map(|d| d.format("%Y-%m-%d")));
        params.push_opt("endDate", self.end_date.map(|d| d.format("%Y-%m-%d")));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            id: "t1".to_string(),
            kind: TransactionType::Expense,
            amount: 42.5,
            category: "Food".to_string(),
            subcategory: Some("Groceries".to_string()),
            description: None,
            date: "2024-03-09T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_parse_transaction_from_api() {
        let json = r#"{"_id":"65f0","type":"income","amount":1200,"category":"Salary","date":"2024-03-01T00:00:00.000Z","user":"u1"}"#;
        let tx: Transaction = serde_json::from_str(json).expect("valid transaction JSON");
        assert_eq!(tx.id, "65f0");
        assert_eq!(tx.kind, TransactionType::Income);
        assert_eq!(tx.amount, 1200.0);
        assert!(tx.subcategory.is_none());
        assert_eq!(tx.day(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_matches_search() {
        let tx = sample();
        assert!(tx.matches_search(""));
        assert!(tx.matches_search("foo"));
        assert!(tx.matches_search("GROCER"));
        assert!(!tx.matches_search("rent"));
    }

    #[test]
    fn test_signed_amount() {
        let mut tx = sample();
        assert_eq!(tx.signed_amount(), -42.5);
        tx.kind = TransactionType::Income;
        assert_eq!(tx.signed_amount(), 42.5);
    }

    #[test]
    fn test_transaction_type_from_str() {
        assert_eq!("Income".parse::<TransactionType>(), Ok(TransactionType::Income));
        assert_eq!(" expense ".parse::<TransactionType>(), Ok(TransactionType::Expense));
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_filters_omit_empty_fields() {
        let filters = TransactionFilters {
            kind: Some(TransactionType::Expense),
            category: Some(String::new()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
        };
        let query = filters.query();
        assert_eq!(
            query.pairs(),
            &[
                ("type".to_string(), "expense".to_string()),
                ("startDate".to_string(), "2024-01-01".to_string()),
            ]
        );
        assert!(TransactionFilters::default().is_empty());
    }

    #[test]
    fn test_input_serializes_wire_names() {
        let input = TransactionInput::from_transaction(&sample()).expect("date parses");
        let value = serde_json::to_value(&input).expect("serializable");
        assert_eq!(value["type"], "expense");
        assert_eq!(value["date"], "2024-03-09");
        assert_eq!(value["subcategory"], "Groceries");
        assert_eq!(value["description"], "");
    }
}
