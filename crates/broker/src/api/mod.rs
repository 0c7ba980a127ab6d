//! Broker endpoint handlers, one module per resource.

mod bindings;
mod catalog;
mod dashboard;
mod health;
mod instances;

use serde::Serialize;

/// Body of successful deletes.
#[derive(Serialize)]
pub struct EmptyResponse {}

pub use bindings::{bind, unbind};
pub use catalog::catalog;
pub use dashboard::{dashboard, update_settings};
pub use health::health;
pub use instances::{deprovision, get_instance, provision};
