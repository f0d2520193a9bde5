//! Packing strategies behind one interface.
//!
//! The partition layer selects a strategy once from the configured
//! [`PackingMode`] and hands every pool to it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fleet::FleetOptimizer;
use crate::greedy::GreedyVolumePacker;
use crate::model::{ContainerProfile, Item, OmittedItem, PackedContainer, StowedItem};
use crate::placer::PlacementConfig;

/// Which engine packs the pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackingMode {
    /// Full 3D placement with rotation, support and weight checks.
    #[default]
    Spatial,
    /// Aggregate volume only, no coordinates.
    Volume,
}

impl PackingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackingMode::Spatial => "spatial",
            PackingMode::Volume => "volume",
        }
    }
}

impl std::str::FromStr for PackingMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spatial" | "3d" => Ok(PackingMode::Spatial),
            "volume" | "volume-only" | "1d" => Ok(PackingMode::Volume),
            other => Err(format!("unknown packing mode '{}'", other)),
        }
    }
}

/// Containers produced for one pool and the items that could not be packed.
#[derive(Clone, Debug, Default)]
pub struct PoolOutcome {
    pub containers: Vec<PackedContainer>,
    pub omitted: Vec<OmittedItem>,
}

/// A strategy that packs the items of one pool into containers of one profile.
///
/// Implementations must place every item in exactly one container or report it
/// as omitted.
pub trait Packer: Send + Sync {
    fn mode(&self) -> PackingMode;

    fn pack_pool(&self, items: Vec<Item>, profile: &ContainerProfile) -> PoolOutcome;
}

/// Full 3D strategy: repeated anchor-point placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpatialPacker {
    fleet: FleetOptimizer,
}

impl SpatialPacker {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            fleet: FleetOptimizer::new(config),
        }
    }
}

impl Packer for SpatialPacker {
    fn mode(&self) -> PackingMode {
        PackingMode::Spatial
    }

    fn pack_pool(&self, items: Vec<Item>, profile: &ContainerProfile) -> PoolOutcome {
        self.fleet.optimize(items, profile)
    }
}

/// Volume-only strategy: first-fit-decreasing against the derated volume and the weight capacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumePacker {
    greedy: GreedyVolumePacker,
}

impl VolumePacker {
    pub fn new(greedy: GreedyVolumePacker) -> Self {
        Self { greedy }
    }
}

impl Packer for VolumePacker {
    fn mode(&self) -> PackingMode {
        PackingMode::Volume
    }

    fn pack_pool(&self, items: Vec<Item>, profile: &ContainerProfile) -> PoolOutcome {
        let packed = self
            .greedy
            .pack(items, profile.volume_capacity, profile.weight_capacity);
        let containers = packed
            .bins
            .into_iter()
            .map(|bin| {
                let mut container = PackedContainer::new(profile.clone());
                for item in bin.items {
                    container.push(StowedItem::unplaced(item));
                }
                container
            })
            .collect();
        PoolOutcome {
            containers,
            omitted: packed.omitted,
        }
    }
}

/// Builds the strategy for `mode`.
pub fn packer_for(
    mode: PackingMode,
    placement: PlacementConfig,
    greedy: GreedyVolumePacker,
) -> Box<dyn Packer> {
    match mode {
        PackingMode::Spatial => Box::new(SpatialPacker::new(placement)),
        PackingMode::Volume => Box::new(VolumePacker::new(greedy)),
    }
}
