//! In-process store for tests and local runs without PostgreSQL.
//!
//! Mirrors [`PgStore`](crate::PgStore) semantics, keeps a log of every
//! `mark_processed` write, and can be told to fail reads or writes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use havoc_core::{format_timestamp, BoundApp, ServiceBinding, ServiceInstance};

use crate::error::StoreError;
use crate::join::join_bound_applications;
use crate::traits::{ProvisioningStore, RegistrationStore};

/// One recorded `mark_processed` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedWrite {
    pub app_id: String,
    pub at: DateTime<Utc>,
    pub rows: u64,
}

#[derive(Default)]
struct Inner {
    instances: HashMap<String, ServiceInstance>,
    /// Insertion-ordered so listings are stable.
    bindings: Vec<ServiceBinding>,
    writes: Vec<ProcessedWrite>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail with [`StoreError::Unavailable`].
    pub async fn set_fail_reads(&self, fail: bool) {
        self.inner.write().await.fail_reads = fail;
    }

    /// Make every subsequent `mark_processed` fail with [`StoreError::Unavailable`].
    pub async fn set_fail_writes(&self, fail: bool) {
        self.inner.write().await.fail_writes = fail;
    }

    /// Every `mark_processed` call that succeeded, oldest first.
    pub async fn processed_log(&self) -> Vec<ProcessedWrite> {
        self.inner.read().await.writes.clone()
    }

    pub async fn binding(&self, id: &str) -> Option<ServiceBinding> {
        self.inner
            .read()
            .await
            .bindings
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub async fn bindings(&self) -> Vec<ServiceBinding> {
        self.inner.read().await.bindings.clone()
    }

    pub async fn instance_count(&self) -> usize {
        self.inner.read().await.instances.len()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn list_bound_applications(&self) -> Result<Vec<BoundApp>, StoreError> {
        let inner = self.inner.read().await;
        if inner.fail_reads {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(join_bound_applications(&inner.instances, &inner.bindings))
    }

    async fn mark_processed(&self, app_id: &str, at: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let stamp = format_timestamp(at);
        let mut rows = 0;
        for binding in inner.bindings.iter_mut().filter(|b| b.app_id == app_id) {
            binding.last_processed = Some(stamp.clone());
            rows += 1;
        }
        inner.writes.push(ProcessedWrite {
            app_id: app_id.to_string(),
            at,
            rows,
        });
        Ok(rows)
    }
}

#[async_trait]
impl ProvisioningStore for MemoryStore {
    async fn get_instance(&self, id: &str) -> Result<Option<ServiceInstance>, StoreError> {
        let inner = self.inner.read().await;
        if inner.fail_reads {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(inner.instances.get(id).cloned())
    }

    async fn create_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.instances.contains_key(&instance.id) {
            return Err(StoreError::conflict("service instance", &instance.id));
        }
        inner.instances.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn update_instance(
        &self,
        id: &str,
        probability: f64,
        frequency: i32,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let instance = inner
            .instances
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("service instance", id))?;
        instance.probability = probability;
        instance.frequency = frequency;
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.bindings.retain(|b| b.service_instance_id != id);
        inner.instances.remove(id);
        Ok(())
    }

    async fn create_binding(&self, binding: &ServiceBinding) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.bindings.iter().any(|b| b.id == binding.id) {
            return Err(StoreError::conflict("service binding", &binding.id));
        }
        inner.bindings.push(binding.clone());
        Ok(())
    }

    async fn delete_binding(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.bindings.retain(|b| b.id != id);
        Ok(())
    }
}
