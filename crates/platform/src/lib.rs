//! Platform access: enumerate an application's instances and kill one.

pub mod cloud_foundry;
pub mod error;
pub mod probe;

pub use cloud_foundry::CloudFoundryClient;
pub use error::PlatformError;
pub use probe::{is_healthy, pick_instance, InstanceState, InstanceStates, PlatformProbe};
