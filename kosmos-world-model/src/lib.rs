//! World-model facade, factory, and graceful degradation (spec §4.4).
//! The graph backend is a derived, best-effort view; see `kosmos-relational`
//! for the authoritative record.

pub mod config;
pub mod degraded;
pub mod facade;
pub mod factory;
mod metrics;

pub use config::{WorldModelConfig, WorldModelMode};
pub use degraded::DegradedStore;
pub use facade::{WorldModel, WorldModelHealth};
pub use factory::get_world_model;
