// src/error.rs

use thiserror::Error;

/// Shown alongside every fetch failure.
pub const FETCH_HINT: &str = "verify the spreadsheet is shared as viewer to anyone with the link";

/// The two ways a dashboard render can fail.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Network, HTTP-status or CSV parse failure while loading the source.
    #[error("failed to load data: {0:#}")]
    Fetch(anyhow::Error),

    /// The loaded table lacks a column the dashboard needs.
    #[error("column `{column}` not found; available columns: {}", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

impl DashboardError {
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Fetch(_) => "fetch",
            DashboardError::MissingColumn { .. } => "schema",
        }
    }
}
