//! Operational views of the store, served by the admin endpoints.

use serde::{Deserialize, Serialize};

/// A table's name and column names.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Column names, in ordinal order
    pub columns: Vec<String>,
}

/// A full dump of one table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TableDump {
    /// Table name
    pub table: String,
    /// Column names, in ordinal order
    pub columns: Vec<String>,
    /// Number of rows returned
    pub row_count: usize,
    /// Every row, as a JSON object keyed by column name
    pub rows: Vec<serde_json::Value>,
}
