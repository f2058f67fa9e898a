use serde::{Deserialize, Serialize};

use super::TransactionType;

/// Color preselected for a new category
pub const DEFAULT_CATEGORY_COLOR: &str = "#3b82f6";

/// Icon preselected for a new category
pub const DEFAULT_CATEGORY_ICON: &str = "📊";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl Category {
    /// Icon and name for list display
    pub fn label(&self) -> String {
        match self.icon.as_deref() {
            Some(icon) if !icon.is_empty() => format!("{} {}", icon, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Payload for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub color: String,
    pub icon: String,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>, kind: TransactionType) -> Self {
        Self {
            name: name.into(),
            kind,
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            icon: DEFAULT_CATEGORY_ICON.to_string(),
        }
    }

    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            kind: category.kind,
            color: category
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            icon: category
                .icon
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        }
    }
}

/// Categories of one type, in server order
pub fn categories_of_kind(categories: &[Category], kind: TransactionType) -> Vec<&Category> {
    categories.iter().filter(|c| c.kind == kind).collect()
}
