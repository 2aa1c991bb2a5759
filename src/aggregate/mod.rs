// src/aggregate/mod.rs

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::DashboardError;
use crate::table::{coerce_int, format_thousands, Table};

/// Column that names the product on each row.
pub const PRODUCT_COLUMN: &str = "item_name";
pub const SESSIONS_COLUMN: &str = "sessions";
pub const ACTIVE_USERS_COLUMN: &str = "active_users";
pub const CONVERSIONS_COLUMN: &str = "conversions";

/// The three summed metrics for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub sessions: i64,
    pub active_users: i64,
    pub conversions: i64,
}

/// [`Metrics`] rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedMetrics {
    pub sessions: String,
    pub active_users: String,
    pub conversions: String,
}

impl Metrics {
    pub fn formatted(&self) -> FormattedMetrics {
        FormattedMetrics {
            sessions: format_thousands(self.sessions),
            active_users: format_thousands(self.active_users),
            conversions: format_thousands(self.conversions),
        }
    }
}

/// Fails with the available columns if the product column is missing.
/// Returns its position on success.
pub fn require_product_column(table: &Table) -> Result<usize, DashboardError> {
    table
        .column_index(PRODUCT_COLUMN)
        .ok_or_else(|| DashboardError::MissingColumn {
            column: PRODUCT_COLUMN.to_string(),
            available: table.columns.clone(),
        })
}

/// Distinct, non-missing product names in lexicographic order.
pub fn product_options(table: &Table) -> Result<Vec<String>, DashboardError> {
    require_product_column(table)?;
    let names: BTreeSet<&str> = table.column(PRODUCT_COLUMN).flatten().collect();
    Ok(names.into_iter().map(str::to_string).collect())
}

/// Rows whose product name equals `product` exactly.
pub fn filter_product(table: &Table, product: &str) -> Result<Table, DashboardError> {
    let idx = require_product_column(table)?;
    Ok(table.filter_rows(|row| row.get(idx).and_then(|c| c.as_deref()) == Some(product)))
}

/// Sum one column; an absent column sums to zero.
pub fn sum_column(table: &Table, column: &str) -> i64 {
    table
        .column(column)
        .map(coerce_int)
        .fold(0i64, i64::saturating_add)
}

pub fn summarize(table: &Table) -> Metrics {
    Metrics {
        sessions: sum_column(table, SESSIONS_COLUMN),
        active_users: sum_column(table, ACTIVE_USERS_COLUMN),
        conversions: sum_column(table, CONVERSIONS_COLUMN),
    }
}

/// Filter to `product`, then summarize the filtered rows.
pub fn aggregate(table: &Table, product: &str) -> Result<(Table, Metrics), DashboardError> {
    let subset = filter_product(table, product)?;
    let metrics = summarize(&subset);
    Ok((subset, metrics))
}
