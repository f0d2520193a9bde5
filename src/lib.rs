//! Container stowage planning.
//!
//! Packs shipments of rectangular items into fleets of shipping containers,
//! either by aggregate volume or by full 3D placement with support and weight
//! checks, and exposes the engine over HTTP.

pub mod api;
pub mod config;
pub mod demo;
pub mod error;
pub mod fleet;
pub mod geometry;
pub mod greedy;
pub mod model;
pub mod packer;
pub mod partition;
pub mod placer;
pub mod types;

pub use error::{PlanError, Result};
pub use model::{ContainerProfile, Item, OmissionReason, PackedContainer};
pub use packer::PackingMode;
pub use partition::{Manifest, PlanningConfig, Pooling, plan_shipment};
pub use placer::PlacementConfig;
