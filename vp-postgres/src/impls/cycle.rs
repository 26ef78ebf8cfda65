use crate::Db;
use crate::impls::BIND_CHUNK;
use sqlx::Row as _;
use vp_core::models::{
    CycleSummary, CycleTag, NewMovement, NewVendorCost, StagedCost, StagedMovement, StatusCount,
    VendorCostCount, VendorMatchStats,
};
use vp_core::ports::CycleRepository;

impl CycleRepository for Db {
    async fn replace_staging(
        &self,
        cycle: &CycleTag,
        movement: &[StagedMovement],
        costs: &[StagedCost],
    ) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("delete from movement_staging where cycle_tag = $1")
            .bind(cycle.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("delete from vendor_cost_staging where cycle_tag = $1")
            .bind(cycle.as_str())
            .execute(&mut *tx)
            .await?;

        for chunk in movement.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into movement_staging \
                 (upc_clean, brand, category, item_name, avg_price, units_sold, cycle_tag) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.upc_clean)
                    .push_bind(&row.brand)
                    .push_bind(&row.category)
                    .push_bind(&row.item_name)
                    .push_bind(row.avg_price)
                    .push_bind(row.units_sold)
                    .push_bind(cycle.as_str());
            });
            builder.build().execute(&mut *tx).await?;
        }

        for chunk in costs.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into vendor_cost_staging (upc_clean, vendor_id, cost, cycle_tag) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.upc_clean)
                    .push_bind(row.vendor.as_str())
                    .push_bind(row.cost)
                    .push_bind(cycle.as_str());
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await
    }

    async fn replace_movement(
        &self,
        cycle: &CycleTag,
        rows: &[NewMovement],
    ) -> Result<u64, Self::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("delete from movement where cycle_tag = $1")
            .bind(cycle.as_str())
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for chunk in rows.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into movement (sku, units_sold, avg_price, cycle_tag) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.sku)
                    .push_bind(row.units_sold)
                    .push_bind(row.avg_price)
                    .push_bind(cycle.as_str());
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn replace_vendor_costs(
        &self,
        cycle: &CycleTag,
        rows: &[NewVendorCost],
    ) -> Result<u64, Self::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("delete from vendor_cost where cycle_tag = $1")
            .bind(cycle.as_str())
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for chunk in rows.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into vendor_cost (sku, vendor_id, cost, cycle_tag) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.sku)
                    .push_bind(&row.vendor_id)
                    .push_bind(row.cost)
                    .push_bind(cycle.as_str());
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn cycle_summary(&self, cycle: &CycleTag) -> Result<Option<CycleSummary>, Self::Error> {
        let movement_rows: i64 =
            sqlx::query_scalar("select count(*) from movement where cycle_tag = $1")
                .bind(cycle.as_str())
                .fetch_one(&self.pool)
                .await?;

        let baseline = sqlx::query(
            "select count(*) as rows, count(distinct upc_clean) as keys \
             from movement_staging where cycle_tag = $1",
        )
        .bind(cycle.as_str())
        .fetch_one(&self.pool)
        .await?;
        let baseline_rows: i64 = baseline.try_get("rows")?;
        // the live run matches against the deduplicated baseline, so
        // the read-back rate divides by distinct keys, not raw rows
        let baseline_keys: i64 = baseline.try_get("keys")?;

        let matches = sqlx::query(
            "select vendor_id, count(*) as staged, \
             count(*) filter (where exists \
                 (select 1 from movement_staging m \
                  where m.cycle_tag = s.cycle_tag and m.upc_clean = s.upc_clean)) as matched \
             from vendor_cost_staging s \
             where cycle_tag = $1 group by vendor_id order by vendor_id",
        )
        .bind(cycle.as_str())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            let vendor: String = row.try_get("vendor_id")?;
            let staged: i64 = row.try_get("staged")?;
            let matched: i64 = row.try_get("matched")?;
            Ok(VendorMatchStats {
                vendor: vendor
                    .parse()
                    .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
                staged: staged as u64,
                matched: matched as u64,
                match_rate: if baseline_keys > 0 {
                    matched as f64 / baseline_keys as f64
                } else {
                    0.0
                },
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let vendor_costs = sqlx::query(
            "select vendor_id, count(*) as n from vendor_cost \
             where cycle_tag = $1 group by vendor_id order by vendor_id",
        )
        .bind(cycle.as_str())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            Ok(VendorCostCount {
                vendor_id: row.try_get("vendor_id")?,
                rows: row.try_get("n")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let proposals = sqlx::query(
            "select status, count(*) as n from price_proposal \
             where cycle_tag = $1 group by status order by status",
        )
        .bind(cycle.as_str())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            let status: String = row.try_get("status")?;
            Ok(StatusCount {
                status: status
                    .parse()
                    .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
                rows: row.try_get("n")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        if movement_rows == 0
            && baseline_rows == 0
            && matches.is_empty()
            && vendor_costs.is_empty()
            && proposals.is_empty()
        {
            return Ok(None);
        }

        Ok(Some(CycleSummary {
            cycle_tag: cycle.clone(),
            baseline_rows,
            movement_rows,
            matches,
            vendor_costs,
            proposals,
        }))
    }
}
