//! Store contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use havoc_core::{BoundApp, ServiceBinding, ServiceInstance};

use crate::error::StoreError;

/// What the chaos engine needs from persistence.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Every live binding joined with its instance.
    ///
    /// Bindings without an instance, with an empty `app_id`, or whose instance
    /// has a zero probability or frequency are left out. An empty result is
    /// not an error.
    async fn list_bound_applications(&self) -> Result<Vec<BoundApp>, StoreError>;

    /// Overwrite `last_processed` on every binding for `app_id`.
    ///
    /// Returns the number of bindings touched; zero (the binding vanished since
    /// it was listed) is still success.
    async fn mark_processed(&self, app_id: &str, at: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// What the provisioning broker needs from persistence.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    async fn get_instance(&self, id: &str) -> Result<Option<ServiceInstance>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the id is taken.
    async fn create_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] if the instance does not exist.
    async fn update_instance(
        &self,
        id: &str,
        probability: f64,
        frequency: i32,
    ) -> Result<(), StoreError>;

    /// Delete the instance and all of its bindings, bindings first.
    async fn delete_instance(&self, id: &str) -> Result<(), StoreError>;

    /// Fails with [`StoreError::Conflict`] if the id is taken.
    async fn create_binding(&self, binding: &ServiceBinding) -> Result<(), StoreError>;

    /// Deleting an unknown binding is a no-op.
    async fn delete_binding(&self, id: &str) -> Result<(), StoreError>;
}
