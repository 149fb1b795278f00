//! Tokio runtime for Zigbee light endpoints
//!
//! Hosts one level transition engine per endpoint, drives its ticks from the
//! tokio timer and broadcasts level and on/off changes to subscribers.

pub mod config;
pub mod device;
pub mod endpoint;
pub mod error;
pub mod reporter;
pub mod ticker;

pub use config::{EndpointConfig, LightConfig};
pub use device::LightDevice;
pub use endpoint::{EndpointHandle, LightEvent};
pub use error::EndpointError;
pub use ticker::TimerTickSource;
