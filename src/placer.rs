//! Anchor-point placement of one wave of items into a single empty container.
//!
//! The placer keeps a set of candidate corners ("anchors"). Items are taken
//! tallest first; each one goes to the lowest, front-most, left-most anchor
//! where it fits the interior, rests on enough support and collides with
//! nothing. A placed box consumes its anchor and opens three new ones at its
//! right, top and back faces.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::geometry::{is_supported, overlaps};
use crate::model::{ContainerProfile, Item, StowedItem};
use crate::types::{BoundingBox, EPSILON_FLOOR, EPSILON_GENERAL, EPSILON_ROTATION, Vec3};

/// Configuration of the placement heuristic.
///
/// Contains the tolerances and thresholds that control stability checks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Minimum fraction of the base area that must rest on lower top faces (0.0 to 1.0)
    pub support_ratio: f64,
    /// Height tolerance for floor and face contact
    pub floor_epsilon: f64,
    /// Length/width difference below which an item counts as square
    pub rotation_epsilon: f64,
    /// Tolerance for interior bound checks
    pub general_epsilon: f64,
    /// Whether items may be turned 90° around the vertical axis
    pub allow_item_rotation: bool,
}

impl PlacementConfig {
    pub const DEFAULT_SUPPORT_RATIO: f64 = 0.6;
    pub const DEFAULT_FLOOR_EPSILON: f64 = EPSILON_FLOOR;
    pub const DEFAULT_ROTATION_EPSILON: f64 = EPSILON_ROTATION;
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_ALLOW_ITEM_ROTATION: bool = true;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            support_ratio: Self::DEFAULT_SUPPORT_RATIO,
            floor_epsilon: Self::DEFAULT_FLOOR_EPSILON,
            rotation_epsilon: Self::DEFAULT_ROTATION_EPSILON,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            allow_item_rotation: Self::DEFAULT_ALLOW_ITEM_ROTATION,
        }
    }
}

/// Builder for PlacementConfig.
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    /// Sets the minimum support ratio.
    pub fn support_ratio(mut self, ratio: f64) -> Self {
        self.config.support_ratio = ratio;
        self
    }

    /// Sets the floor/contact tolerance.
    pub fn floor_epsilon(mut self, epsilon: f64) -> Self {
        self.config.floor_epsilon = epsilon;
        self
    }

    /// Sets the tolerance for treating an item as square.
    pub fn rotation_epsilon(mut self, epsilon: f64) -> Self {
        self.config.rotation_epsilon = epsilon;
        self
    }

    /// Sets the tolerance for interior bound checks.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Enables or disables 90° rotation around the vertical axis.
    pub fn allow_item_rotation(mut self, allow: bool) -> Self {
        self.config.allow_item_rotation = allow;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Items placed into one container and the ones that have to wait for the next.
#[derive(Clone, Debug, Default)]
pub struct WaveOutcome {
    /// Placed items in placement order.
    pub placed: Vec<StowedItem>,
    /// Deferred items in the order they were encountered.
    pub leftovers: Vec<Item>,
    /// Accumulated weight after the wave.
    pub used_weight: f64,
}

/// Horizontal orientation candidate.
#[derive(Clone, Copy, Debug)]
struct Orientation {
    dims: Vec3,
    rotated: bool,
}

/// Accepted anchor/orientation combination.
#[derive(Clone, Copy, Debug)]
struct Slot {
    anchor_index: usize,
    orientation: Orientation,
}

/// Places items into a single container with the anchor-point heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpatialPlacer {
    config: PlacementConfig,
}

impl SpatialPlacer {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Places as many of `items` as possible into an empty container of `profile`.
    ///
    /// # Parameters
    /// * `items` - Items of this wave
    /// * `profile` - Container interior to fill
    /// * `accumulated_weight` - Weight already counted against `weight_cap`
    /// * `weight_cap` - Hard payload limit in kg
    ///
    /// # Returns
    /// `WaveOutcome` with the placed items (with positions) and the leftovers
    pub fn place_wave(
        &self,
        items: Vec<Item>,
        profile: &ContainerProfile,
        accumulated_weight: f64,
        weight_cap: f64,
    ) -> WaveOutcome {
        let interior = profile.dims_as_vec3();

        // Tall and bulky items first so that they form the base layer.
        let mut items = items;
        items.sort_by(|a, b| {
            b.height
                .total_cmp(&a.height)
                .then_with(|| b.volume.total_cmp(&a.volume))
        });

        let mut anchors: Vec<Vec3> = vec![Vec3::zero()];
        let mut occupied: Vec<BoundingBox> = Vec::new();
        let mut outcome = WaveOutcome {
            used_weight: accumulated_weight,
            ..WaveOutcome::default()
        };

        for item in items {
            if outcome.used_weight + item.weight > weight_cap {
                trace!("⚖️ Item {} deferred: weight cap {} kg", item.id, weight_cap);
                outcome.leftovers.push(item);
                continue;
            }

            anchors.sort_by(anchor_order);

            let Some(slot) = self.find_slot(&item, &anchors, &occupied, interior) else {
                trace!("🔁 Item {} deferred: no anchor fits", item.id);
                outcome.leftovers.push(item);
                continue;
            };

            let anchor = anchors.remove(slot.anchor_index);
            let dims = slot.orientation.dims;
            anchors.push(Vec3::new(anchor.x + dims.x, anchor.y, anchor.z));
            anchors.push(Vec3::new(anchor.x, anchor.y + dims.y, anchor.z));
            anchors.push(Vec3::new(anchor.x, anchor.y, anchor.z + dims.z));

            occupied.push(BoundingBox::from_position_and_dims(anchor, dims));
            outcome.used_weight += item.weight;
            outcome
                .placed
                .push(StowedItem::placed(item, anchor, slot.orientation.rotated));
        }

        debug!(
            "📦 Wave into {}: {} placed, {} deferred, {:.1} kg",
            profile.kind,
            outcome.placed.len(),
            outcome.leftovers.len(),
            outcome.used_weight
        );
        outcome
    }

    /// Declared orientation first, then the 90° turn unless the footprint is square.
    fn orientations(&self, item: &Item) -> impl Iterator<Item = Orientation> {
        let declared = Orientation {
            dims: Vec3::new(item.length, item.height, item.width),
            rotated: false,
        };
        let turnable = self.config.allow_item_rotation
            && (item.length - item.width).abs() >= self.config.rotation_epsilon;
        let turned = turnable.then(|| Orientation {
            dims: Vec3::new(item.width, item.height, item.length),
            rotated: true,
        });
        std::iter::once(declared).chain(turned)
    }

    /// First anchor/orientation pair that fits, is supported and collides with nothing.
    fn find_slot(
        &self,
        item: &Item,
        anchors: &[Vec3],
        occupied: &[BoundingBox],
        interior: Vec3,
    ) -> Option<Slot> {
        for (anchor_index, anchor) in anchors.iter().enumerate() {
            for orientation in self.orientations(item) {
                let candidate = BoundingBox::from_position_and_dims(*anchor, orientation.dims);

                if !candidate
                    .max
                    .fits_within(&interior, self.config.general_epsilon)
                {
                    continue;
                }

                if !is_supported(
                    &candidate,
                    occupied,
                    self.config.floor_epsilon,
                    self.config.support_ratio,
                ) {
                    continue;
                }

                if occupied.iter().any(|placed| overlaps(placed, &candidate)) {
                    continue;
                }

                return Some(Slot {
                    anchor_index,
                    orientation,
                });
            }
        }
        None
    }
}

/// Lowest first, then front to back, then left to right.
fn anchor_order(a: &Vec3, b: &Vec3) -> Ordering {
    a.y.total_cmp(&b.y)
        .then_with(|| a.z.total_cmp(&b.z))
        .then_with(|| a.x.total_cmp(&b.x))
}
