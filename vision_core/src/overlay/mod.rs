//! Consumer adapters over the query surface.
//!
//! These adapters own no visibility state of their own: they read published
//! snapshots through [`VisionQuery`](crate::query::VisionQuery) and map
//! coordinates through the shared `WorldConfig`. The renderer and minimap
//! consume their output buffers; the entity filter answers per-entity
//! show/hide decisions.

pub mod dimming;
pub mod entity_vis;
pub mod minimap;

pub use dimming::DimmingOverlay;
pub use entity_vis::EntityVisibilityFilter;
pub use minimap::MinimapFog;
