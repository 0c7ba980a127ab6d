//! Persistence for chaos registrations.
//!
//! Two tables back the data model: `service_instances` (chaos parameters) and
//! `service_bindings` (target applications plus `last_processed`). The engine
//! sees them through [`RegistrationStore`]; the provisioning broker through
//! [`ProvisioningStore`].

pub mod error;
pub mod join;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use join::join_bound_applications;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{ProvisioningStore, RegistrationStore};
