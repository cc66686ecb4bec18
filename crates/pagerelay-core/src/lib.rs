//! PageRelay Core — error taxonomy and configuration shared by the broker
//! and the server.

pub mod config;
pub mod error;

pub use config::RelayConfig;
pub use error::{Error, Result};
