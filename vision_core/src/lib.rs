//! Fog-of-war visibility core for the Ashfield RTS prototype.
//!
//! Tracks per-player tri-state visibility (Unexplored / Explored / Visible)
//! over a bounded 2D world. Vision sources register on entity spawn, a
//! throttled aggregation sweep rasterizes their discs into per-owner grids,
//! and consumers (world dimming, the minimap fog texture, per-entity
//! show/hide) read the result through [`VisionQuery`] and the shared
//! [`WorldConfig`] mapping.

mod aggregator;
pub mod config;
pub mod coords;
mod events;
mod grid;
pub mod metrics;
pub mod overlay;
mod query;
mod service;
mod sources;

pub use config::{
    load_settings_from_env, BrightnessLevels, SettingsError, SettingsMetadata, VisionSettings,
    VisionSettingsHandle,
};
pub use coords::{WorldConfig, WorldConfigError};
pub use events::{EntityEvent, EntityEventSender};
pub use grid::{CellState, GridSnapshot, PlayerId, SharedSnapshot, VisibilityGrid, VisionLedger};
pub use metrics::{OwnerStateCounts, VisionStatus};
pub use overlay::{DimmingOverlay, EntityVisibilityFilter, MinimapFog};
pub use query::VisionQuery;
pub use service::VisibilityService;
pub use sources::{EntityId, SourceId, SourceRegistry, VisionSource};
