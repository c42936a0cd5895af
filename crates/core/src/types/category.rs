//! Expense categories.
//!
//! The category set is closed. Receipt extraction may suggest arbitrary
//! strings; anything outside this set is discarded by callers rather than
//! written to the store.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a recognized expense category.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized expense category: {0}")]
pub struct CategoryParseError(pub String);

/// Fixed set of expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    OfficeSupplies,
    Travel,
    Meals,
    Software,
    Marketing,
    Utilities,
    Rent,
    Equipment,
    Shipping,
    #[default]
    Other,
}

impl ExpenseCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 10] = [
        Self::OfficeSupplies,
        Self::Travel,
        Self::Meals,
        Self::Software,
        Self::Marketing,
        Self::Utilities,
        Self::Rent,
        Self::Equipment,
        Self::Shipping,
        Self::Other,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OfficeSupplies => "Office Supplies",
            Self::Travel => "Travel",
            Self::Meals => "Meals",
            Self::Software => "Software",
            Self::Marketing => "Marketing",
            Self::Utilities => "Utilities",
            Self::Rent => "Rent",
            Self::Equipment => "Equipment",
            Self::Shipping => "Shipping",
            Self::Other => "Other",
        }
    }

    /// Parse a suggested category leniently.
    ///
    /// Matching is case-insensitive and tolerates spaces, dashes, and
    /// underscores, since suggestions come back from free-text extraction.
    /// Returns `None` for anything outside the closed set.
    #[must_use]
    pub fn parse_suggestion(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "officesupplies" | "office" | "supplies" => Some(Self::OfficeSupplies),
            "travel" => Some(Self::Travel),
            "meals" | "food" => Some(Self::Meals),
            "software" | "saas" => Some(Self::Software),
            "marketing" | "advertising" => Some(Self::Marketing),
            "utilities" => Some(Self::Utilities),
            "rent" => Some(Self::Rent),
            "equipment" | "hardware" => Some(Self::Equipment),
            "shipping" | "postage" => Some(Self::Shipping),
            "other" | "misc" | "miscellaneous" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_suggestion(s).ok_or_else(|| CategoryParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        assert_eq!(
            ExpenseCategory::parse_suggestion("travel"),
            Some(ExpenseCategory::Travel)
        );
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(
            ExpenseCategory::parse_suggestion("Office Supplies"),
            Some(ExpenseCategory::OfficeSupplies)
        );
        assert_eq!(
            ExpenseCategory::parse_suggestion("office_supplies"),
            Some(ExpenseCategory::OfficeSupplies)
        );
        assert_eq!(
            ExpenseCategory::parse_suggestion("SaaS"),
            Some(ExpenseCategory::Software)
        );
    }

    #[test]
    fn test_parse_unknown_is_discarded() {
        assert_eq!(ExpenseCategory::parse_suggestion("cryptocurrency"), None);
        assert!("cryptocurrency".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ExpenseCategory::OfficeSupplies).unwrap();
        assert_eq!(json, "\"office_supplies\"");
    }
}
