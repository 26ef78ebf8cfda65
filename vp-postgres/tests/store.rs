//! Round-trip tests against a real PostgreSQL.
//!
//! These are ignored by default: provision a scratch database and run
//! `DATABASE_URL=postgres://… cargo test -p vp-postgres -- --ignored`.
//! The tests clear every table, so never point them at live data.

use rust_decimal_macros::dec;
use vp_core::models::{CycleTag, NewMovement, NewVendorCost, Product, ProposalDraft, ProposalQuery, ProposalStatus, StagedCost, StagedMovement, Vendor};
use vp_core::ports::{
    AdminRepository as _, CatalogRepository as _, CycleRepository as _, ProposalFailure,
    ProposalRepository as _,
};
use vp_postgres::{Db, config::PostgresConfig};

async fn open_scratch_db() -> Db {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
    let config = PostgresConfig {
        url,
        ..Default::default()
    };
    let db = Db::open(&config).await.expect("failed to open database");
    db.clear_tables().await.expect("failed to clear tables");
    db
}

fn product(sku: &str) -> Product {
    Product {
        sku: sku.to_owned(),
        brand: Some("Test Brand".to_owned()),
        category: Some("Test Category".to_owned()),
        item_name: Some("Test Product".to_owned()),
        size: Some("1 EA".to_owned()),
    }
}

#[tokio::test]
#[ignore = "requires a provisioned PostgreSQL (DATABASE_URL)"]
async fn products_upsert_and_read_back() {
    let db = open_scratch_db().await;

    let initial = vec![product("000000000001"), product("000000000002")];
    assert_eq!(db.upsert_products(&initial).await.unwrap(), 2);

    // second upsert refreshes instead of duplicating
    let mut updated = initial.clone();
    updated[0].brand = Some("Rebranded".to_owned());
    db.upsert_products(&updated).await.unwrap();

    let read = db.get_product("000000000001").await.unwrap().unwrap();
    assert_eq!(read.brand.as_deref(), Some("Rebranded"));
    assert!(db.get_product("000000000099").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a provisioned PostgreSQL (DATABASE_URL)"]
async fn cycle_rows_replace_on_rerun() {
    let db = open_scratch_db().await;
    let cycle: CycleTag = "2025-07".parse().unwrap();

    db.upsert_products(&[product("000000000001")]).await.unwrap();

    let movement = vec![NewMovement {
        sku: "000000000001".to_owned(),
        units_sold: None,
        avg_price: Some(dec!(4.99)),
    }];
    let costs = vec![NewVendorCost {
        sku: "000000000001".to_owned(),
        vendor_id: "UNFI".to_owned(),
        cost: dec!(2.50),
    }];

    assert_eq!(db.replace_movement(&cycle, &movement).await.unwrap(), 1);
    assert_eq!(db.replace_vendor_costs(&cycle, &costs).await.unwrap(), 1);

    // a rerun converges to the same row counts
    assert_eq!(db.replace_movement(&cycle, &movement).await.unwrap(), 1);
    assert_eq!(db.replace_vendor_costs(&cycle, &costs).await.unwrap(), 1);

    let staged_movement = vec![StagedMovement {
        upc_clean: "1".to_owned(),
        brand: None,
        category: None,
        item_name: None,
        avg_price: Some(dec!(4.99)),
        units_sold: None,
    }];
    let staged_costs = vec![StagedCost {
        upc_clean: "1".to_owned(),
        vendor: Vendor::Unfi,
        cost: Some(dec!(2.50)),
    }];
    db.replace_staging(&cycle, &staged_movement, &staged_costs)
        .await
        .unwrap();

    let summary = db.cycle_summary(&cycle).await.unwrap().unwrap();
    assert_eq!(summary.movement_rows, 1);
    assert_eq!(summary.baseline_rows, 1);
    assert_eq!(summary.matches.len(), 1);
    assert_eq!(summary.matches[0].vendor, Vendor::Unfi);
    assert_eq!(summary.matches[0].staged, 1);
    assert_eq!(summary.matches[0].matched, 1);
    assert!((summary.matches[0].match_rate - 1.0).abs() < 1e-9);
    assert_eq!(summary.vendor_costs.len(), 1);
    assert_eq!(summary.vendor_costs[0].vendor_id, "UNFI");
    assert_eq!(summary.vendor_costs[0].rows, 1);

    let missing: CycleTag = "1999-01".parse().unwrap();
    assert!(db.cycle_summary(&missing).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a provisioned PostgreSQL (DATABASE_URL)"]
async fn proposal_review_flow() {
    let db = open_scratch_db().await;
    let cycle: CycleTag = "2025-07".parse().unwrap();

    db.upsert_products(&[product("000000000001")]).await.unwrap();
    let drafts = vec![ProposalDraft {
        sku: "000000000001".to_owned(),
        auto_price: dec!(3.57),
    }];
    assert_eq!(db.replace_proposals(&cycle, &drafts).await.unwrap(), 1);

    let pending = db
        .list_proposals(
            &ProposalQuery {
                cycle: Some(cycle.clone()),
                status: Some(ProposalStatus::Pending),
            },
            100,
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    let id = pending[0].id;

    let edited = db.edit_proposal(id, dec!(3.49)).await.unwrap().unwrap();
    assert_eq!(edited.edited_price, Some(dec!(3.49)));
    assert_eq!(edited.effective_price(), dec!(3.49));

    let approved = db.approve_proposal(id).await.unwrap().unwrap();
    assert_eq!(approved.status, ProposalStatus::Approved);

    // approving twice is a status conflict, not an error
    assert_eq!(
        db.approve_proposal(id).await.unwrap().unwrap_err(),
        ProposalFailure::InvalidStatus
    );
    assert_eq!(
        db.approve_proposal(id + 1000).await.unwrap().unwrap_err(),
        ProposalFailure::DoesNotExist
    );
}

#[tokio::test]
#[ignore = "requires a provisioned PostgreSQL (DATABASE_URL)"]
async fn admin_surface() {
    let db = open_scratch_db().await;

    db.ping().await.unwrap();
    db.ensure_schema().await.unwrap();

    let tables = db.list_tables().await.unwrap();
    assert!(tables.iter().any(|t| t.name == "products"));
    let products = tables.iter().find(|t| t.name == "products").unwrap();
    assert_eq!(
        products.columns,
        ["sku", "brand", "category", "item_name", "size"]
    );

    db.create_product(&product("000000000042")).await.unwrap();

    let counts = db.table_counts().await.unwrap();
    assert_eq!(counts["products"], 1);

    let dump = db.dump_table("products").await.unwrap().unwrap();
    assert_eq!(dump.row_count, 1);
    assert_eq!(dump.rows[0]["sku"], "000000000042");

    assert!(db.dump_table("pg_tables").await.unwrap().is_none());

    let cleared = db.clear_tables().await.unwrap();
    assert_eq!(cleared.last().map(String::as_str), Some("products"));
    assert_eq!(db.table_counts().await.unwrap()["products"], 0);
}
