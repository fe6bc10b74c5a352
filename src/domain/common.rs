use serde::{Deserialize, Serialize};
pub use uuid::Uuid;

/// A monetary amount expressed in milliunits (one thousandth of the budget's base
/// currency unit). Never convert this to a float except at the read-API boundary.
pub type Milliunits = i64;

/// Currency presentation metadata carried on the `Budget` entity. Scaling an integer
/// amount by the decimal digits is the only place money becomes a float in this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyFormat {
    pub iso_code: String,
    pub decimal_digits: u32,
    pub decimal_separator: String,
    pub symbol_first: bool,
    pub group_separator: String,
    pub currency_symbol: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            iso_code: "USD".into(),
            decimal_digits: 2,
            decimal_separator: ".".into(),
            symbol_first: true,
            group_separator: ",".into(),
            currency_symbol: "$".into(),
        }
    }
}

impl CurrencyFormat {
    /// Scales a milliunit amount into the budget's base currency unit.
    pub fn to_scaled(&self, milliunits: Milliunits) -> f64 {
        milliunits as f64 / 1000.0
    }

    /// Formats a milliunit amount as `<symbol><amount>` using this format's rules.
    /// Intentionally simple: locale-aware rendering belongs to the MCP tool layer.
    pub fn format(&self, milliunits: Milliunits) -> String {
        let scaled = self.to_scaled(milliunits);
        let digits = self.decimal_digits as usize;
        let number = format!("{:.*}", digits, scaled.abs());
        let sign = if milliunits < 0 { "-" } else { "" };
        if self.symbol_first {
            format!("{sign}{}{number}", self.currency_symbol)
        } else {
            format!("{sign}{number}{}", self.currency_symbol)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearedStatus {
    Cleared,
    Uncleared,
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebtTransactionType {
    Payment,
    Refund,
    Fee,
    Interest,
    Escrow,
    BalanceAdjustment,
    Credit,
    Charge,
}

/// Implemented by every entity that participates in delta merges: a stable id.
/// `merge_entity_array` and `merge_month_array` in `crate::merge` operate generically
/// over this trait (plus [`IsDeleted`]) rather than per concrete type.
pub trait HasId {
    fn entity_id(&self) -> Uuid;
}

/// Implemented by every entity that can arrive soft-deleted in a delta payload.
pub trait IsDeleted {
    fn is_deleted(&self) -> bool;
}
