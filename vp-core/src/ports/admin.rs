use crate::models::{TableDump, TableInfo};
use std::collections::BTreeMap;

/// Repository interface for operational/administrative access.
///
/// These back the `/admin` endpoints: schema management and raw table
/// inspection. Implementations must only ever touch tables from their
/// own fixed registry; the `table` argument of [`AdminRepository::dump_table`]
/// is a lookup into that registry, never a SQL fragment.
pub trait AdminRepository: super::Repository {
    /// Cheap connectivity check (a `select 1` round trip).
    fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Create or migrate the schema to the current version.
    fn ensure_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Every known table with its column names.
    fn list_tables(&self) -> impl Future<Output = Result<Vec<TableInfo>, Self::Error>> + Send;

    /// Row count per known table.
    fn table_counts(
        &self,
    ) -> impl Future<Output = Result<BTreeMap<String, i64>, Self::Error>> + Send;

    /// Full dump of one table, or `None` when the name is not in the
    /// registry.
    fn dump_table(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Option<TableDump>, Self::Error>> + Send;

    /// Delete every row from every known table, children before
    /// parents. Returns the tables cleared, in deletion order.
    fn clear_tables(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;
}
