use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes;
use crate::config::IssueTrackerConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmIssuesRepository;

/// Wires the SeaORM repository into the domain service and exposes the REST routes.
#[derive(Clone)]
pub struct IssueTracker {
    service: Arc<Service>,
}

impl IssueTracker {
    pub fn new(db: DatabaseConnection, cfg: &IssueTrackerConfig) -> Self {
        info!(
            "Initializing issue_tracker module (store_timeout_ms={})",
            cfg.store_timeout_ms
        );

        let repo = SeaOrmIssuesRepository::new(db);
        let service_config = ServiceConfig {
            store_timeout: Duration::from_millis(cfg.store_timeout_ms),
        };
        Self {
            service: Arc::new(Service::new(Arc::new(repo), service_config)),
        }
    }

    /// Bring the schema up to date.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running issue_tracker database migrations");
        Migrator::up(db, None)
            .await
            .context("issue_tracker migrations failed")?;
        info!("Issue database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering issue_tracker REST routes");
        routes::register_routes(router, self.service.clone())
    }
}
