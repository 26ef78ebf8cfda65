use crate::Db;
use crate::tables::{self, CLEAR_ORDER, TABLES};
use std::collections::BTreeMap;
use vp_core::models::{TableDump, TableInfo};
use vp_core::ports::AdminRepository;

async fn table_columns(pool: &sqlx::PgPool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "select column_name::text from information_schema.columns \
         where table_schema = 'public' and table_name = $1 \
         order by ordinal_position",
    )
    .bind(table)
    .fetch_all(pool)
    .await
}

impl AdminRepository for Db {
    async fn ping(&self) -> Result<(), Self::Error> {
        sqlx::query("select 1").execute(&self.pool).await.map(|_| ())
    }

    async fn ensure_schema(&self) -> Result<(), Self::Error> {
        crate::MIGRATOR.run(&self.pool).await.map_err(sqlx::Error::from)
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>, Self::Error> {
        let mut result = Vec::with_capacity(TABLES.len());
        for name in TABLES {
            let columns = table_columns(&self.pool, name).await?;
            // tables absent from information_schema have not been migrated yet
            if !columns.is_empty() {
                result.push(TableInfo {
                    name: name.to_owned(),
                    columns,
                });
            }
        }
        Ok(result)
    }

    async fn table_counts(&self) -> Result<BTreeMap<String, i64>, Self::Error> {
        let mut counts = BTreeMap::new();
        for name in TABLES {
            let count: i64 = sqlx::query_scalar(&format!("select count(*) from {name}"))
                .fetch_one(&self.pool)
                .await?;
            counts.insert(name.to_owned(), count);
        }
        Ok(counts)
    }

    async fn dump_table(&self, table: &str) -> Result<Option<TableDump>, Self::Error> {
        let Some(name) = tables::resolve(table) else {
            return Ok(None);
        };

        let columns = table_columns(&self.pool, name).await?;
        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar(&format!("select to_jsonb(t) from {name} t order by 1"))
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(TableDump {
            table: name.to_owned(),
            columns,
            row_count: rows.len(),
            rows,
        }))
    }

    async fn clear_tables(&self) -> Result<Vec<String>, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let mut cleared = Vec::with_capacity(CLEAR_ORDER.len());
        for name in CLEAR_ORDER {
            sqlx::query(&format!("delete from {name}")).execute(&mut *tx).await?;
            cleared.push(name.to_owned());
        }
        tx.commit().await?;

        tracing::info!(tables = cleared.len(), "cleared all tables");
        Ok(cleared)
    }
}
