//! Provisioning broker: the HTTP surface a platform marketplace calls to
//! register applications for chaos.

pub mod api;
pub mod catalog;
pub mod error;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::BrokerState;
