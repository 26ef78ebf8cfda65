use crate::Db;
use crate::impls::BIND_CHUNK;
use rust_decimal::Decimal;
use sqlx::Row as _;
use vp_core::models::{
    CycleTag, InvalidCycleTag, PriceProposal, ProposalDraft, ProposalQuery, ProposalStatus,
};
use vp_core::ports::{ProposalFailure, ProposalRepository};

const PROPOSAL_COLUMNS: &str = "id, sku, cycle_tag, auto_price, edited_price, status";

fn row_to_proposal(row: &sqlx::postgres::PgRow) -> Result<PriceProposal, sqlx::Error> {
    let cycle: String = row.try_get("cycle_tag")?;
    let status: String = row.try_get("status")?;

    Ok(PriceProposal {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        cycle_tag: cycle
            .parse()
            .map_err(|e: InvalidCycleTag| sqlx::Error::Decode(Box::new(e)))?,
        auto_price: row.try_get("auto_price")?,
        edited_price: row.try_get("edited_price")?,
        status: status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
    })
}

impl ProposalRepository for Db {
    async fn replace_proposals(
        &self,
        cycle: &CycleTag,
        drafts: &[ProposalDraft],
    ) -> Result<u64, Self::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("delete from price_proposal where cycle_tag = $1")
            .bind(cycle.as_str())
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for chunk in drafts.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into price_proposal (sku, cycle_tag, auto_price, status) ",
            );
            builder.push_values(chunk, |mut b, draft| {
                b.push_bind(&draft.sku)
                    .push_bind(cycle.as_str())
                    .push_bind(draft.auto_price)
                    .push_bind(ProposalStatus::Pending.as_str());
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn list_proposals(
        &self,
        query: &ProposalQuery,
        limit: usize,
    ) -> Result<Vec<PriceProposal>, Self::Error> {
        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "select {PROPOSAL_COLUMNS} from price_proposal where true"
        ));
        if let Some(cycle) = &query.cycle {
            builder.push(" and cycle_tag = ").push_bind(cycle.as_str());
        }
        if let Some(status) = &query.status {
            builder.push(" and status = ").push_bind(status.as_str());
        }
        builder.push(" order by id desc limit ").push_bind(limit as i64);

        builder
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_proposal)
            .collect()
    }

    async fn edit_proposal(
        &self,
        id: i64,
        new_price: Decimal,
    ) -> Result<Result<PriceProposal, ProposalFailure>, Self::Error> {
        let updated = sqlx::query(&format!(
            "update price_proposal set edited_price = $2 \
             where id = $1 and status = 'pending' \
             returning {PROPOSAL_COLUMNS}"
        ))
        .bind(id)
        .bind(new_price)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(Ok(row_to_proposal(&row)?)),
            None => Ok(Err(self.proposal_failure(id).await?)),
        }
    }

    async fn approve_proposal(
        &self,
        id: i64,
    ) -> Result<Result<PriceProposal, ProposalFailure>, Self::Error> {
        let updated = sqlx::query(&format!(
            "update price_proposal set status = 'approved' \
             where id = $1 and status = 'pending' \
             returning {PROPOSAL_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(Ok(row_to_proposal(&row)?)),
            None => Ok(Err(self.proposal_failure(id).await?)),
        }
    }
}

impl Db {
    /// A conditional update matched nothing: figure out whether the
    /// proposal is missing or just not pending.
    async fn proposal_failure(&self, id: i64) -> Result<ProposalFailure, sqlx::Error> {
        let exists: Option<i64> = sqlx::query_scalar("select id from price_proposal where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(if exists.is_some() {
            ProposalFailure::InvalidStatus
        } else {
            ProposalFailure::DoesNotExist
        })
    }
}
