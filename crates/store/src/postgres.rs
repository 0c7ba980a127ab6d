//! PostgreSQL-backed store.
//!
//! Reads are plain per-table selects; the join happens in memory via
//! [`join_bound_applications`]. No statement spans both tables, so a
//! registration deleted between list and update simply updates zero rows.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::{error, info, warn};

use havoc_core::config::DatabaseConfig;
use havoc_core::{format_timestamp, BoundApp, ServiceBinding, ServiceInstance};

use crate::error::StoreError;
use crate::join::join_bound_applications;
use crate::traits::{ProvisioningStore, RegistrationStore};

#[derive(Debug, sqlx::FromRow)]
struct InstanceRow {
    id: String,
    dashboard_url: String,
    plan_id: String,
    probability: f64,
    frequency: i32,
}

impl From<InstanceRow> for ServiceInstance {
    fn from(row: InstanceRow) -> Self {
        Self {
            id: row.id,
            dashboard_url: row.dashboard_url,
            plan_id: row.plan_id,
            probability: row.probability,
            frequency: row.frequency,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BindingRow {
    id: String,
    app_id: String,
    service_plan_id: String,
    service_instance_id: String,
    last_processed: Option<String>,
}

impl From<BindingRow> for ServiceBinding {
    fn from(row: BindingRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            service_plan_id: row.service_plan_id,
            service_instance_id: row.service_instance_id,
            // Empty strings written by older brokers mean "never processed".
            last_processed: row.last_processed.filter(|s| !s.is_empty()),
        }
    }
}

/// Registration store over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(connect_options(config))
            .await?;
        info!("PostgreSQL connected: {}", config.host);

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All instances keyed by id.
    pub async fn read_instances(&self) -> Result<HashMap<String, ServiceInstance>, StoreError> {
        let rows = sqlx::query_as::<_, InstanceRow>(
            "SELECT id, dashboard_url, plan_id, probability, frequency
             FROM service_instances",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id.clone(), ServiceInstance::from(row)))
            .collect())
    }

    pub async fn read_bindings(&self) -> Result<Vec<ServiceBinding>, StoreError> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT id, app_id, service_plan_id, service_instance_id, last_processed
             FROM service_bindings",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ServiceBinding::from).collect())
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn list_bound_applications(&self) -> Result<Vec<BoundApp>, StoreError> {
        let instances = self.read_instances().await?;
        let bindings = self.read_bindings().await?;
        Ok(join_bound_applications(&instances, &bindings))
    }

    async fn mark_processed(&self, app_id: &str, at: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE service_bindings SET last_processed = $1 WHERE app_id = $2",
        )
        .bind(format_timestamp(at))
        .bind(app_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProvisioningStore for PgStore {
    async fn get_instance(&self, id: &str) -> Result<Option<ServiceInstance>, StoreError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            "SELECT id, dashboard_url, plan_id, probability, frequency
             FROM service_instances
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ServiceInstance::from))
    }

    async fn create_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO service_instances (id, dashboard_url, plan_id, probability, frequency)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&instance.id)
        .bind(&instance.dashboard_url)
        .bind(&instance.plan_id)
        .bind(instance.probability)
        .bind(instance.frequency)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "service instance", &instance.id))?;
        Ok(())
    }

    async fn update_instance(
        &self,
        id: &str,
        probability: f64,
        frequency: i32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE service_instances SET probability = $1, frequency = $2 WHERE id = $3",
        )
        .bind(probability)
        .bind(frequency)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("service instance", id));
        }
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM service_bindings WHERE service_instance_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM service_instances WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_binding(&self, binding: &ServiceBinding) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO service_bindings
                 (id, app_id, service_plan_id, service_instance_id, last_processed)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&binding.id)
        .bind(&binding.app_id)
        .bind(&binding.service_plan_id)
        .bind(&binding.service_instance_id)
        .bind(&binding.last_processed)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "service binding", &binding.id))?;
        Ok(())
    }

    async fn delete_binding(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM service_bindings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Connection settings built field by field, so credentials are never
/// embedded in a URL.
fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let ssl_mode = config.ssl_mode.parse::<PgSslMode>().unwrap_or_else(|_| {
        warn!(ssl_mode = %config.ssl_mode, "unknown sslmode, using prefer");
        PgSslMode::Prefer
    });
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .ssl_mode(ssl_mode);
    if let Some(username) = &config.username {
        options = options.username(username);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    options
}

fn map_unique_violation(e: sqlx::Error, kind: &'static str, id: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::conflict(kind, id);
        }
    }
    error!("registration store database error: {}", e);
    StoreError::Database(e)
}
