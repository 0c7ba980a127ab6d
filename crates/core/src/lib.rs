pub mod config;
pub mod error;
pub mod model;
pub mod timestamp;
pub mod vcap;

pub use config::Config;
pub use error::*;
pub use model::*;
pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_LAYOUT};
