//! Level transition engine for a Zigbee dimmable light
//!
//! This crate implements the On/Off and Level Control cluster behavior of a
//! light endpoint: ramping the level over time or at a rate, and coupling
//! those ramps to the on/off state. Timers and notifications are supplied by
//! the caller through [`TickSource`] and [`LightObserver`].

pub mod attributes;
pub mod cluster;
pub mod engine;
pub mod handler;
pub mod ramp;

pub use attributes::LevelAttributes;
pub use cluster::{ClusterCommand, LevelCommand, MoveMode, OnOffCommand, MAX_LEVEL, MIN_LEVEL};
pub use engine::{LevelTransitionEngine, LightObserver, LightState, TickSource, TriggerKind};
pub use handler::LevelControlHandler;
pub use ramp::{Direction, Ramp, TICK_PERIOD};
