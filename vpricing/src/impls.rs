//! Concrete application wiring.
//!
//! This module provides the concrete implementation of the `Application`
//! port, tying the PostgreSQL store and the Graph ingestion pipeline
//! together for the HTTP layer.

use crate::PricingConfig;
use time::OffsetDateTime;
use vp_core::models::{CycleReport, CycleTag};
use vp_core::ports::Application;
use vp_ingest::{CycleError, CyclePipeline, GraphClient};
use vp_postgres::Db;

/// The production application: PostgreSQL store plus Graph ingestion.
#[derive(Clone)]
pub struct App {
    /// Database connection for persistent storage
    pub db: Db,
    pipeline: CyclePipeline<Db>,
}

impl App {
    /// Wire the application from its configured parts.
    pub fn new(db: Db, graph: GraphClient, pricing: &PricingConfig) -> Self {
        let pipeline = CyclePipeline::new(graph, db.clone(), pricing.margin());
        Self { db, pipeline }
    }
}

impl Application for App {
    type Repository = Db;
    type IngestError = CycleError;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    async fn run_cycle(&self, cycle: CycleTag) -> Result<CycleReport, Self::IngestError> {
        self.pipeline.run(cycle).await
    }
}
