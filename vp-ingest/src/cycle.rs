//! The vendor pricing cycle.
//!
//! One run takes the mailbox through to pending proposals: download
//! attachments, identify and extract each feed, stage the raw rows,
//! promote matched rows into the canonical tables, and generate a
//! proposal per product from its cheapest vendor cost.

use crate::feed::{self, Extraction, FeedError};
use crate::graph::{GraphClient, GraphError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vp_core::models::{
    CycleReport, CycleTag, Detection, IdentifiedFile, NewMovement, NewVendorCost, Product,
    ProposalDraft, StagedCost, StagedMovement, Vendor, VendorMatchStats, auto_price, canonical,
};
use vp_core::ports::{CatalogRepository, CycleRepository, ProposalRepository};

/// Errors from a pricing cycle run.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Mailbox retrieval failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A feed file could not be read
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The storage backend failed
    #[error("storage failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CycleError {
    fn store<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Store(Box::new(error))
    }
}

/// Drives one ingestion cycle against a repository backend.
#[derive(Clone)]
pub struct CyclePipeline<R> {
    graph: GraphClient,
    store: R,
    target_margin: Decimal,
}

impl<R> CyclePipeline<R>
where
    R: CatalogRepository + CycleRepository + ProposalRepository + Send + Sync,
{
    /// Assemble a pipeline from its parts. `target_margin` is the gross
    /// margin the auto-price rule aims for.
    pub fn new(graph: GraphClient, store: R, target_margin: Decimal) -> Self {
        Self {
            graph,
            store,
            target_margin,
        }
    }

    /// Run the full cycle for `cycle` and report what happened.
    ///
    /// An empty mailbox is an empty report, not an error. A file that
    /// fails to parse aborts the run: a half-ingested cycle would
    /// silently skew the matching statistics and the proposals.
    pub async fn run(&self, cycle: CycleTag) -> Result<CycleReport, CycleError> {
        tracing::info!(%cycle, "starting vendor pricing cycle");

        let files = self.graph.download_recent_attachments().await?;
        let mut report = CycleReport::empty(cycle.clone());
        report.files_found = files.iter().map(|p| file_name(p)).collect();

        if files.is_empty() {
            tracing::warn!(%cycle, "no attachments downloaded, nothing to ingest");
            return Ok(report);
        }

        // Downloads arrive newest message first, so the first file to
        // claim a vendor slot wins and later ones are set aside.
        let mut selected: BTreeMap<Vendor, (PathBuf, Detection)> = BTreeMap::new();
        for path in &files {
            let name = file_name(path);
            match feed::detect_file(path)? {
                Some(detection) if selected.contains_key(&detection.vendor) => {
                    tracing::info!(file = %name, vendor = %detection.vendor, "superseded by a newer file");
                    report.superseded.push(name);
                }
                Some(detection) => {
                    tracing::info!(
                        file = %name,
                        vendor = %detection.vendor,
                        header_row = detection.header_row,
                        "identified feed"
                    );
                    selected.insert(detection.vendor, (path.clone(), detection));
                }
                None => {
                    tracing::warn!(file = %name, "could not identify feed");
                    report.unidentified.push(name);
                }
            }
        }
        report.identified = selected
            .iter()
            .map(|(vendor, (path, _))| IdentifiedFile {
                vendor: *vendor,
                file: file_name(path),
            })
            .collect();

        let mut movement: Vec<StagedMovement> = Vec::new();
        let mut costs: Vec<StagedCost> = Vec::new();
        for (path, detection) in selected.values() {
            match feed::extract_file(path, *detection)? {
                Extraction::Movement(rows) => {
                    tracing::info!(rows = rows.len(), "extracted ECRS baseline");
                    movement = rows;
                }
                Extraction::Costs(rows) => {
                    tracing::info!(vendor = %detection.vendor, rows = rows.len(), "extracted cost list");
                    costs.extend(rows);
                }
            }
        }

        self.store
            .replace_staging(&cycle, &movement, &costs)
            .await
            .map_err(CycleError::store)?;
        report.baseline_rows = movement.len() as u64;

        let plan = plan_promotion(&movement, &costs, self.target_margin);
        report.matches = plan.matches;

        if plan.products.is_empty() {
            tracing::warn!(%cycle, "no ECRS movement baseline, skipping promotion");
            return Ok(report);
        }

        report.products_upserted = self
            .store
            .upsert_products(&plan.products)
            .await
            .map_err(CycleError::store)?;
        report.movement_rows = self
            .store
            .replace_movement(&cycle, &plan.movement)
            .await
            .map_err(CycleError::store)?;
        report.cost_rows = self
            .store
            .replace_vendor_costs(&cycle, &plan.costs)
            .await
            .map_err(CycleError::store)?;
        report.proposals = self
            .store
            .replace_proposals(&cycle, &plan.proposals)
            .await
            .map_err(CycleError::store)?;

        for stats in &report.matches {
            tracing::info!(
                vendor = %stats.vendor,
                staged = stats.staged,
                matched = stats.matched,
                rate = format!("{:.1}%", stats.match_rate * 100.0),
                "vendor match"
            );
        }
        tracing::info!(
            %cycle,
            products = report.products_upserted,
            costs = report.cost_rows,
            proposals = report.proposals,
            "cycle complete"
        );

        Ok(report)
    }
}

/// Everything the promotion step will write, computed in one pass.
struct PromotionPlan {
    products: Vec<Product>,
    movement: Vec<NewMovement>,
    costs: Vec<NewVendorCost>,
    proposals: Vec<ProposalDraft>,
    matches: Vec<VendorMatchStats>,
}

/// Match staged vendor costs against the staged baseline and derive the
/// canonical rows and proposals.
///
/// The baseline is deduplicated on match key (first row wins). A vendor
/// row promotes only when its key appears in the baseline; its cost
/// feeds the per-product minimum that prices the proposal.
fn plan_promotion(
    movement: &[StagedMovement],
    costs: &[StagedCost],
    target_margin: Decimal,
) -> PromotionPlan {
    let mut baseline: BTreeMap<&str, &StagedMovement> = BTreeMap::new();
    for row in movement {
        baseline.entry(row.upc_clean.as_str()).or_insert(row);
    }

    let products: Vec<Product> = baseline
        .values()
        .map(|row| Product {
            sku: canonical(&row.upc_clean),
            brand: row.brand.clone(),
            category: row.category.clone(),
            item_name: row.item_name.clone(),
            size: None,
        })
        .collect();

    let movement_rows: Vec<NewMovement> = baseline
        .values()
        .map(|row| NewMovement {
            sku: canonical(&row.upc_clean),
            units_sold: row.units_sold,
            avg_price: row.avg_price,
        })
        .collect();

    let mut staged_per_vendor: BTreeMap<Vendor, u64> = BTreeMap::new();
    let mut matched_per_vendor: BTreeMap<Vendor, u64> = BTreeMap::new();
    let mut cost_rows: Vec<NewVendorCost> = Vec::new();
    let mut min_costs: BTreeMap<String, Decimal> = BTreeMap::new();

    for row in costs {
        *staged_per_vendor.entry(row.vendor).or_default() += 1;
        if !baseline.contains_key(row.upc_clean.as_str()) {
            continue;
        }
        *matched_per_vendor.entry(row.vendor).or_default() += 1;

        if let Some(cost) = row.cost {
            let sku = canonical(&row.upc_clean);
            min_costs
                .entry(sku.clone())
                .and_modify(|current| {
                    if cost < *current {
                        *current = cost;
                    }
                })
                .or_insert(cost);
            cost_rows.push(NewVendorCost {
                sku,
                vendor_id: row.vendor.as_str().to_owned(),
                cost,
            });
        }
    }

    let base = baseline.len() as f64;
    let matches = staged_per_vendor
        .iter()
        .map(|(vendor, staged)| {
            let matched = matched_per_vendor.get(vendor).copied().unwrap_or(0);
            VendorMatchStats {
                vendor: *vendor,
                staged: *staged,
                matched,
                match_rate: if base > 0.0 { matched as f64 / base } else { 0.0 },
            }
        })
        .collect();

    let proposals = min_costs
        .into_iter()
        .map(|(sku, min_cost)| ProposalDraft {
            auto_price: auto_price(min_cost, target_margin),
            sku,
        })
        .collect();

    PromotionPlan {
        products,
        movement: movement_rows,
        costs: cost_rows,
        proposals,
        matches,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn staged_movement(upc: &str, price: &str) -> StagedMovement {
        StagedMovement {
            upc_clean: upc.to_owned(),
            brand: Some("Acme".to_owned()),
            category: None,
            item_name: None,
            avg_price: price.parse().ok(),
            units_sold: None,
        }
    }

    fn staged_cost(upc: &str, vendor: Vendor, cost: Decimal) -> StagedCost {
        StagedCost {
            upc_clean: upc.to_owned(),
            vendor,
            cost: Some(cost),
        }
    }

    #[test]
    fn promotion_matches_and_prices_from_the_minimum_cost() {
        let movement = vec![
            staged_movement("12345678901", "4.99"),
            staged_movement("7592530120", "2.49"),
            // duplicate baseline key: first row wins
            staged_movement("12345678901", "5.99"),
        ];
        let costs = vec![
            staged_cost("12345678901", Vendor::Unfi, dec!(2.80)),
            staged_cost("12345678901", Vendor::Kehe, dec!(2.10)),
            // no baseline counterpart: staged but never promoted
            staged_cost("99999999999", Vendor::Kehe, dec!(1.00)),
        ];

        let plan = plan_promotion(&movement, &costs, dec!(0.30));

        assert_eq!(plan.products.len(), 2);
        assert!(plan.products.iter().any(|p| p.sku == "012345678901"));
        assert_eq!(plan.movement.len(), 2);
        assert_eq!(plan.costs.len(), 2);

        // min cost 2.10 at 30% margin -> 3.00
        assert_eq!(plan.proposals.len(), 1);
        assert_eq!(plan.proposals[0].sku, "012345678901");
        assert_eq!(plan.proposals[0].auto_price, dec!(3.00));

        let kehe = plan
            .matches
            .iter()
            .find(|s| s.vendor == Vendor::Kehe)
            .unwrap();
        assert_eq!(kehe.staged, 2);
        assert_eq!(kehe.matched, 1);
        assert!((kehe.match_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn promotion_with_no_baseline_writes_nothing() {
        let costs = vec![staged_cost("12345678901", Vendor::Hana, dec!(2.00))];
        let plan = plan_promotion(&[], &costs, dec!(0.30));

        assert!(plan.products.is_empty());
        assert!(plan.movement.is_empty());
        assert!(plan.costs.is_empty());
        assert!(plan.proposals.is_empty());

        let hana = plan.matches.iter().find(|s| s.vendor == Vendor::Hana).unwrap();
        assert_eq!(hana.staged, 1);
        assert_eq!(hana.matched, 0);
        assert_eq!(hana.match_rate, 0.0);
    }

    #[test]
    fn costless_matches_count_but_do_not_price() {
        let movement = vec![staged_movement("12345678901", "4.99")];
        let costs = vec![StagedCost {
            upc_clean: "12345678901".to_owned(),
            vendor: Vendor::Osa,
            cost: None,
        }];

        let plan = plan_promotion(&movement, &costs, dec!(0.30));
        let osa = plan.matches.iter().find(|s| s.vendor == Vendor::Osa).unwrap();
        assert_eq!(osa.matched, 1);
        assert!(plan.costs.is_empty());
        assert!(plan.proposals.is_empty());
    }
}
