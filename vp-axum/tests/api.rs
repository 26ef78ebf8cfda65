//! API tests against an in-memory backend.
//!
//! The mock store implements every repository port over a mutex-held
//! struct, so the full HTTP surface is exercised without a database.

use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use vp_axum::config::AxumConfig;
use vp_core::models::{
    CycleReport, CycleSummary, CycleTag, NewMovement, NewVendorCost, PriceProposal, Product,
    ProposalDraft, ProposalQuery, ProposalStatus, StagedCost, StagedMovement, StatusCount,
    TableDump, TableInfo, Vendor, VendorCostCount, VendorMatchStats,
};
use vp_core::ports::{
    AdminRepository, Application, CatalogRepository, CycleRepository, ProposalFailure,
    ProposalRepository, Repository,
};

#[derive(Default)]
struct Inner {
    products: BTreeMap<String, Product>,
    movement: Vec<(CycleTag, NewMovement)>,
    costs: Vec<(CycleTag, NewVendorCost)>,
    staged_movement: Vec<(CycleTag, StagedMovement)>,
    staged_costs: Vec<(CycleTag, StagedCost)>,
    proposals: Vec<PriceProposal>,
    next_proposal_id: i64,
}

#[derive(Clone, Default)]
struct MockStore(Arc<Mutex<Inner>>);

impl Repository for MockStore {
    type Error = Infallible;
}

impl CatalogRepository for MockStore {
    async fn upsert_products(&self, products: &[Product]) -> Result<u64, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        for product in products {
            inner.products.insert(product.sku.clone(), product.clone());
        }
        Ok(products.len() as u64)
    }

    async fn create_product(&self, product: &Product) -> Result<(), Self::Error> {
        let mut inner = self.0.lock().unwrap();
        inner.products.insert(product.sku.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, sku: &str) -> Result<Option<Product>, Self::Error> {
        Ok(self.0.lock().unwrap().products.get(sku).cloned())
    }
}

impl CycleRepository for MockStore {
    async fn replace_staging(
        &self,
        cycle: &CycleTag,
        movement: &[StagedMovement],
        costs: &[StagedCost],
    ) -> Result<(), Self::Error> {
        let mut inner = self.0.lock().unwrap();
        inner.staged_movement.retain(|(tag, _)| tag != cycle);
        inner.staged_costs.retain(|(tag, _)| tag != cycle);
        inner
            .staged_movement
            .extend(movement.iter().map(|row| (cycle.clone(), row.clone())));
        inner
            .staged_costs
            .extend(costs.iter().map(|row| (cycle.clone(), row.clone())));
        Ok(())
    }

    async fn replace_movement(
        &self,
        cycle: &CycleTag,
        rows: &[NewMovement],
    ) -> Result<u64, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        inner.movement.retain(|(tag, _)| tag != cycle);
        inner
            .movement
            .extend(rows.iter().map(|row| (cycle.clone(), row.clone())));
        Ok(rows.len() as u64)
    }

    async fn replace_vendor_costs(
        &self,
        cycle: &CycleTag,
        rows: &[NewVendorCost],
    ) -> Result<u64, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        inner.costs.retain(|(tag, _)| tag != cycle);
        inner
            .costs
            .extend(rows.iter().map(|row| (cycle.clone(), row.clone())));
        Ok(rows.len() as u64)
    }

    async fn cycle_summary(&self, cycle: &CycleTag) -> Result<Option<CycleSummary>, Self::Error> {
        let inner = self.0.lock().unwrap();

        let movement_rows = inner
            .movement
            .iter()
            .filter(|(tag, _)| tag == cycle)
            .count() as i64;

        let baseline_rows = inner
            .staged_movement
            .iter()
            .filter(|(tag, _)| tag == cycle)
            .count() as i64;
        let baseline_keys: BTreeSet<&str> = inner
            .staged_movement
            .iter()
            .filter(|(tag, _)| tag == cycle)
            .map(|(_, row)| row.upc_clean.as_str())
            .collect();

        let mut per_vendor: BTreeMap<Vendor, (u64, u64)> = BTreeMap::new();
        for (tag, row) in &inner.staged_costs {
            if tag != cycle {
                continue;
            }
            let entry = per_vendor.entry(row.vendor).or_default();
            entry.0 += 1;
            if baseline_keys.contains(row.upc_clean.as_str()) {
                entry.1 += 1;
            }
        }
        let matches: Vec<VendorMatchStats> = per_vendor
            .into_iter()
            .map(|(vendor, (staged, matched))| VendorMatchStats {
                vendor,
                staged,
                matched,
                match_rate: if baseline_keys.is_empty() {
                    0.0
                } else {
                    matched as f64 / baseline_keys.len() as f64
                },
            })
            .collect();

        let mut by_vendor: BTreeMap<String, i64> = BTreeMap::new();
        for (tag, cost) in &inner.costs {
            if tag == cycle {
                *by_vendor.entry(cost.vendor_id.clone()).or_default() += 1;
            }
        }

        let mut by_status: BTreeMap<&'static str, i64> = BTreeMap::new();
        for proposal in &inner.proposals {
            if proposal.cycle_tag == *cycle {
                *by_status.entry(proposal.status.as_str()).or_default() += 1;
            }
        }

        if movement_rows == 0
            && baseline_rows == 0
            && matches.is_empty()
            && by_vendor.is_empty()
            && by_status.is_empty()
        {
            return Ok(None);
        }

        Ok(Some(CycleSummary {
            cycle_tag: cycle.clone(),
            baseline_rows,
            movement_rows,
            matches,
            vendor_costs: by_vendor
                .into_iter()
                .map(|(vendor_id, rows)| VendorCostCount { vendor_id, rows })
                .collect(),
            proposals: by_status
                .into_iter()
                .map(|(status, rows)| StatusCount {
                    status: status.parse().unwrap(),
                    rows,
                })
                .collect(),
        }))
    }
}

impl ProposalRepository for MockStore {
    async fn replace_proposals(
        &self,
        cycle: &CycleTag,
        drafts: &[ProposalDraft],
    ) -> Result<u64, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        inner.proposals.retain(|p| p.cycle_tag != *cycle);
        for draft in drafts {
            inner.next_proposal_id += 1;
            let id = inner.next_proposal_id;
            inner.proposals.push(PriceProposal {
                id,
                sku: draft.sku.clone(),
                cycle_tag: cycle.clone(),
                auto_price: draft.auto_price,
                edited_price: None,
                status: ProposalStatus::Pending,
            });
        }
        Ok(drafts.len() as u64)
    }

    async fn list_proposals(
        &self,
        query: &ProposalQuery,
        limit: usize,
    ) -> Result<Vec<PriceProposal>, Self::Error> {
        let inner = self.0.lock().unwrap();
        let mut matches: Vec<PriceProposal> = inner
            .proposals
            .iter()
            .filter(|p| query.cycle.as_ref().is_none_or(|c| p.cycle_tag == *c))
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        matches.sort_by_key(|p| std::cmp::Reverse(p.id));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn edit_proposal(
        &self,
        id: i64,
        new_price: Decimal,
    ) -> Result<Result<PriceProposal, ProposalFailure>, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        let Some(proposal) = inner.proposals.iter_mut().find(|p| p.id == id) else {
            return Ok(Err(ProposalFailure::DoesNotExist));
        };
        if proposal.status != ProposalStatus::Pending {
            return Ok(Err(ProposalFailure::InvalidStatus));
        }
        proposal.edited_price = Some(new_price);
        Ok(Ok(proposal.clone()))
    }

    async fn approve_proposal(
        &self,
        id: i64,
    ) -> Result<Result<PriceProposal, ProposalFailure>, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        let Some(proposal) = inner.proposals.iter_mut().find(|p| p.id == id) else {
            return Ok(Err(ProposalFailure::DoesNotExist));
        };
        if proposal.status != ProposalStatus::Pending {
            return Ok(Err(ProposalFailure::InvalidStatus));
        }
        proposal.status = ProposalStatus::Approved;
        Ok(Ok(proposal.clone()))
    }
}

impl AdminRepository for MockStore {
    async fn ping(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>, Self::Error> {
        Ok(vec![TableInfo {
            name: "products".to_owned(),
            columns: ["sku", "brand", "category", "item_name", "size"]
                .map(str::to_owned)
                .to_vec(),
        }])
    }

    async fn table_counts(&self) -> Result<BTreeMap<String, i64>, Self::Error> {
        let inner = self.0.lock().unwrap();
        Ok(BTreeMap::from([(
            "products".to_owned(),
            inner.products.len() as i64,
        )]))
    }

    async fn dump_table(&self, table: &str) -> Result<Option<TableDump>, Self::Error> {
        if table != "products" {
            return Ok(None);
        }
        let inner = self.0.lock().unwrap();
        let rows: Vec<serde_json::Value> = inner
            .products
            .values()
            .map(|p| serde_json::to_value(p).unwrap())
            .collect();
        Ok(Some(TableDump {
            table: table.to_owned(),
            columns: ["sku", "brand", "category", "item_name", "size"]
                .map(str::to_owned)
                .to_vec(),
            row_count: rows.len(),
            rows,
        }))
    }

    async fn clear_tables(&self) -> Result<Vec<String>, Self::Error> {
        let mut inner = self.0.lock().unwrap();
        *inner = Inner::default();
        Ok(vec!["products".to_owned()])
    }
}

#[derive(Clone)]
struct TestApp {
    store: MockStore,
}

impl Application for TestApp {
    type Repository = MockStore;
    type IngestError = Infallible;

    fn database(&self) -> &Self::Repository {
        &self.store
    }

    fn now(&self) -> time::OffsetDateTime {
        time::OffsetDateTime::now_utc()
    }

    async fn run_cycle(&self, cycle: CycleTag) -> Result<CycleReport, Self::IngestError> {
        let mut report = CycleReport::empty(cycle);
        report.files_found = vec!["empty-mailbox.csv".to_owned()];
        Ok(report)
    }
}

fn server() -> (TestServer, MockStore) {
    let store = MockStore::default();
    let app = TestApp {
        store: store.clone(),
    };
    let server = TestServer::new(vp_axum::router(app, AxumConfig::default())).unwrap();
    (server, store)
}

#[tokio::test]
async fn health_reports_database_connectivity() {
    let (server, _) = server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn admin_surface_round_trip() {
    let (server, _) = server();

    let response = server.post("/admin/tables").await;
    assert_eq!(response.status_code().as_u16(), 201);

    let response = server.post("/admin/seed").await;
    assert_eq!(response.status_code().as_u16(), 201);
    let seeded: serde_json::Value = response.json();
    let sku = seeded["sku"].as_str().unwrap().to_owned();
    assert!(sku.starts_with("TEST"));

    let response = server.get("/admin/tables").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["tables"][0]["name"], "products");

    let response = server.get("/admin/tables/counts").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["table_counts"]["products"], 1);

    let response = server.get("/admin/tables/products").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["row_count"], 1);
    assert_eq!(body["rows"][0]["sku"], sku.as_str());

    let response = server.get("/admin/tables/nonsense").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let response = server.post("/admin/clear").await;
    assert_eq!(response.status_code().as_u16(), 200);
    let response = server.get("/admin/tables/counts").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["table_counts"]["products"], 0);
}

#[tokio::test]
async fn proposal_review_over_http() {
    let (server, store) = server();

    let cycle: CycleTag = "2025-07".parse().unwrap();
    store
        .replace_proposals(
            &cycle,
            &[
                ProposalDraft {
                    sku: "000000000001".to_owned(),
                    auto_price: dec!(3.00),
                },
                ProposalDraft {
                    sku: "000000000002".to_owned(),
                    auto_price: dec!(7.14),
                },
            ],
        )
        .await
        .unwrap();

    let response = server
        .get("/proposal")
        .add_query_param("cycle", "2025-07")
        .add_query_param("status", "pending")
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    let listed: serde_json::Value = response.json();
    assert_eq!(listed.as_array().unwrap().len(), 2);

    // newest first
    let first_id = listed[0]["id"].as_i64().unwrap();
    let second_id = listed[1]["id"].as_i64().unwrap();
    assert!(first_id > second_id);

    let response = server
        .put(&format!("/proposal/{second_id}"))
        .json(&serde_json::json!({ "edited_price": "2.79" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    let edited: serde_json::Value = response.json();
    assert_eq!(edited["edited_price"], "2.79");
    assert_eq!(edited["status"], "pending");

    let response = server.post(&format!("/proposal/{second_id}/approve")).await;
    assert_eq!(response.status_code().as_u16(), 200);
    let approved: serde_json::Value = response.json();
    assert_eq!(approved["status"], "approved");

    // a second approval conflicts
    let response = server.post(&format!("/proposal/{second_id}/approve")).await;
    assert_eq!(response.status_code().as_u16(), 409);

    // editing an approved proposal conflicts too
    let response = server
        .put(&format!("/proposal/{second_id}"))
        .json(&serde_json::json!({ "edited_price": "2.59" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 409);

    let response = server.post("/proposal/999999/approve").await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn cycle_endpoints() {
    let (server, store) = server();

    // triggering a cycle returns the report
    let response = server.post("/cycle").add_query_param("tag", "2025-07").await;
    assert_eq!(response.status_code().as_u16(), 200);
    let report: serde_json::Value = response.json();
    assert_eq!(report["cycle_tag"], "2025-07");
    assert_eq!(report["files_found"][0], "empty-mailbox.csv");

    // no data recorded yet
    let response = server.get("/cycle/2025-07/summary").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let cycle: CycleTag = "2025-07".parse().unwrap();
    store
        .replace_staging(
            &cycle,
            &[StagedMovement {
                upc_clean: "52100070827".to_owned(),
                brand: None,
                category: None,
                item_name: None,
                avg_price: Some(dec!(4.99)),
                units_sold: None,
            }],
            &[
                StagedCost {
                    upc_clean: "52100070827".to_owned(),
                    vendor: Vendor::Kehe,
                    cost: Some(dec!(2.10)),
                },
                StagedCost {
                    upc_clean: "99999999999".to_owned(),
                    vendor: Vendor::Kehe,
                    cost: Some(dec!(1.00)),
                },
            ],
        )
        .await
        .unwrap();
    store
        .replace_movement(
            &cycle,
            &[NewMovement {
                sku: "000000000001".to_owned(),
                units_sold: None,
                avg_price: Some(dec!(4.99)),
            }],
        )
        .await
        .unwrap();
    store
        .replace_vendor_costs(
            &cycle,
            &[NewVendorCost {
                sku: "000000000001".to_owned(),
                vendor_id: "KEHE".to_owned(),
                cost: dec!(2.10),
            }],
        )
        .await
        .unwrap();

    let response = server.get("/cycle/2025-07/summary").await;
    assert_eq!(response.status_code().as_u16(), 200);
    let summary: serde_json::Value = response.json();
    assert_eq!(summary["movement_rows"], 1);
    assert_eq!(summary["baseline_rows"], 1);
    // the staged/matched breakdown mirrors the live cycle report
    assert_eq!(summary["matches"][0]["vendor"], "KEHE");
    assert_eq!(summary["matches"][0]["staged"], 2);
    assert_eq!(summary["matches"][0]["matched"], 1);
    assert_eq!(summary["vendor_costs"][0]["vendor_id"], "KEHE");

    // malformed tags are rejected before touching the store
    let response = server.get("/cycle/bad!tag/summary").await;
    assert_eq!(response.status_code().as_u16(), 400);
}
