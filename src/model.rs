//! Data models for shipment planning.
//!
//! This module defines the fundamental data structures of the packing engine:
//! - `Item`: A physical item with declared volume, weight and extent
//! - `StowedItem`: An item assigned to a container, optionally with a 3D placement
//! - `ContainerProfile`: Static description of a container type
//! - `PackedContainer`: One filled container with its running totals
//! - `OmittedItem`: An item the engine could not place, with the reason

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{PlanError, Result};
use crate::types::{
    BoundingBox, Dimensional, EPSILON_GENERAL, Positioned, Vec3, validation,
};

/// Represents a physical item to be shipped.
///
/// Extents are given in metres, volume in m³ and weight in kg. The declared
/// `volume` is what counts towards utilisation; it does not have to equal
/// `length × width × height` (pallets, irregular goods).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "P-1001",
    "name": "Frozen fish",
    "category": "Perishable_Refrigerated",
    "destination": "Rotterdam",
    "volume": 2.4,
    "weight": 1150.0,
    "length": 1.6,
    "width": 0.8,
    "height": 1.9
}))]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub category: String,
    pub destination: String,
    pub volume: f64,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Item {
    /// Creates an item with the given extent and weight.
    ///
    /// The declared volume defaults to the geometric volume; category and
    /// destination start empty and are set with the `with_*` helpers.
    ///
    /// # Examples
    /// ```
    /// use stowage_planner::model::Item;
    ///
    /// let item = Item::new("A", (2.0, 1.0, 1.5), 300.0).with_category("Dry_General");
    /// assert_eq!(item.volume, 3.0);
    /// assert!(item.validate().is_ok());
    /// ```
    pub fn new(id: impl Into<String>, dims: (f64, f64, f64), weight: f64) -> Self {
        let (length, width, height) = dims;
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            destination: String::new(),
            volume: Vec3::new(length, height, width).volume(),
            weight,
            length,
            width,
            height,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Overrides the declared volume.
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Rejects negative or non-finite measures.
    ///
    /// Zero extents pass; such items are treated as degenerate geometry by the placer.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.volume, "Volume"),
            (self.weight, "Weight"),
            (self.length, "Length"),
            (self.width, "Width"),
            (self.height, "Height"),
        ];
        for (value, name) in checks {
            validation::validate_non_negative(value, name).map_err(|reason| {
                PlanError::InvalidItem {
                    id: self.id.clone(),
                    reason,
                }
            })?;
        }
        Ok(())
    }

    /// Extent in container axes for the declared orientation.
    #[inline]
    pub fn dims_as_vec3(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        self.dims_as_vec3()
    }
}

/// Resolved 3D placement of an item inside one container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    /// Lower front left corner, container-local.
    pub position: Vec3,
    /// `true` when length and width were swapped relative to the declared orientation.
    pub rotated: bool,
}

/// An item assigned to a container.
///
/// Spatial packing always sets `placement`; volume-only packing leaves it empty.
#[derive(Clone, Debug, PartialEq)]
pub struct StowedItem {
    pub item: Item,
    pub placement: Option<Placement>,
}

impl StowedItem {
    /// Item assigned by volume only, without coordinates.
    pub fn unplaced(item: Item) -> Self {
        Self {
            item,
            placement: None,
        }
    }

    /// Item with a resolved position and orientation.
    pub fn placed(item: Item, position: Vec3, rotated: bool) -> Self {
        Self {
            item,
            placement: Some(Placement { position, rotated }),
        }
    }

    pub fn is_rotated(&self) -> bool {
        self.placement.is_some_and(|p| p.rotated)
    }

    /// Length along the container's x axis after orientation.
    pub fn length(&self) -> f64 {
        if self.is_rotated() {
            self.item.width
        } else {
            self.item.length
        }
    }

    /// Extent along the container's z axis after orientation.
    pub fn width(&self) -> f64 {
        if self.is_rotated() {
            self.item.length
        } else {
            self.item.width
        }
    }

    pub fn height(&self) -> f64 {
        self.item.height
    }

    /// Occupied box, if the item has a placement.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.placement.map(|_| BoundingBox::of(self))
    }
}

impl Dimensional for StowedItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length(), self.height(), self.width())
    }
}

impl Positioned for StowedItem {
    fn position(&self) -> Vec3 {
        self.placement.map(|p| p.position).unwrap_or_else(Vec3::zero)
    }
}

/// Static description of a container type.
///
/// # Fields
/// * `kind` - Human readable profile name (e.g. "High Cube")
/// * `length`, `width`, `height` - Interior extent in metres
/// * `volume_capacity` - Nominal capacity in m³
/// * `weight_capacity` - Maximum payload in kg
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerProfile {
    pub kind: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub volume_capacity: f64,
    pub weight_capacity: f64,
}

impl ContainerProfile {
    /// Creates a profile after validating every extent and capacity.
    pub fn new(
        kind: impl Into<String>,
        dims: (f64, f64, f64),
        volume_capacity: f64,
        weight_capacity: f64,
    ) -> Result<Self> {
        let kind = kind.into();
        let (length, width, height) = dims;
        let checks = [
            (length, "Container length"),
            (width, "Container width"),
            (height, "Container height"),
            (volume_capacity, "Volume capacity"),
            (weight_capacity, "Weight capacity"),
        ];
        for (value, name) in checks {
            validation::validate_positive(value, name).map_err(|reason| {
                PlanError::InvalidProfile {
                    kind: kind.clone(),
                    reason,
                }
            })?;
        }
        Ok(Self {
            kind,
            length,
            width,
            height,
            volume_capacity,
            weight_capacity,
        })
    }

    /// 40' refrigerated container.
    pub fn refrigerated() -> Self {
        Self {
            kind: "Refrigerated".to_string(),
            length: 11.58,
            width: 2.29,
            height: 2.40,
            volume_capacity: 58.0,
            weight_capacity: 26_000.0,
        }
    }

    /// 40' high cube dry container.
    pub fn high_cube() -> Self {
        Self {
            kind: "High Cube".to_string(),
            length: 12.03,
            width: 2.35,
            height: 2.69,
            volume_capacity: 76.4,
            weight_capacity: 28_000.0,
        }
    }

    /// Interior extent in container axes.
    #[inline]
    pub fn dims_as_vec3(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }

    /// Checks whether an item could stand in an empty container of this type.
    ///
    /// The swapped footprint is only considered when `allow_rotation` is set.
    pub fn can_hold(&self, item: &Item, allow_rotation: bool) -> bool {
        let interior = self.dims_as_vec3();
        let declared = Vec3::new(item.length, item.height, item.width);
        let rotated = Vec3::new(item.width, item.height, item.length);
        declared.fits_within(&interior, EPSILON_GENERAL)
            || (allow_rotation && rotated.fits_within(&interior, EPSILON_GENERAL))
    }
}

impl Dimensional for ContainerProfile {
    fn dimensions(&self) -> Vec3 {
        self.dims_as_vec3()
    }
}

/// A filled container.
///
/// Running totals are maintained by [`PackedContainer::push`]; the label is
/// assigned once the container's pool and fleet index are known.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedContainer {
    pub label: Option<String>,
    pub profile: ContainerProfile,
    pub items: Vec<StowedItem>,
    pub used_volume: f64,
    pub used_weight: f64,
}

impl PackedContainer {
    /// Creates an empty container of the given profile.
    pub fn new(profile: ContainerProfile) -> Self {
        Self {
            label: None,
            profile,
            items: Vec::new(),
            used_volume: 0.0,
            used_weight: 0.0,
        }
    }

    /// Adds an item and updates the running totals.
    pub fn push(&mut self, stowed: StowedItem) {
        self.used_volume += stowed.item.volume;
        self.used_weight += stowed.item.weight;
        self.items.push(stowed);
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Volume usage relative to the nominal capacity, in percent.
    pub fn volume_utilization_pct(&self) -> f64 {
        if self.profile.volume_capacity <= 0.0 {
            return 0.0;
        }
        self.used_volume / self.profile.volume_capacity * 100.0
    }

    /// Payload usage relative to the weight capacity, in percent.
    pub fn weight_utilization_pct(&self) -> f64 {
        if self.profile.weight_capacity <= 0.0 {
            return 0.0;
        }
        self.used_weight / self.profile.weight_capacity * 100.0
    }

    /// Distinct categories present, in sorted order.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.items.iter().map(|s| s.item.category.as_str()).collect()
    }

    /// Bounding boxes of all items that carry a placement.
    pub fn occupied_boxes(&self) -> Vec<BoundingBox> {
        self.items
            .iter()
            .filter_map(StowedItem::bounding_box)
            .collect()
    }
}

/// Item the engine could not place, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct OmittedItem {
    pub item: Item,
    pub reason: OmissionReason,
}

/// Reasons why an item ended up outside every container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OmissionReason {
    TooHeavyForContainer,
    DimensionsExceedContainer,
    ExceedsEffectiveVolume,
    NoStablePosition,
    ContainerLimitReached,
}

impl OmissionReason {
    pub fn code(&self) -> &'static str {
        match self {
            OmissionReason::TooHeavyForContainer => "too_heavy_for_container",
            OmissionReason::DimensionsExceedContainer => "dimensions_exceed_container",
            OmissionReason::ExceedsEffectiveVolume => "exceeds_effective_volume",
            OmissionReason::NoStablePosition => "no_stable_position",
            OmissionReason::ContainerLimitReached => "container_limit_reached",
        }
    }

    /// Classifies why an item did not fit into an empty container of `profile`.
    pub fn for_unplaceable(item: &Item, profile: &ContainerProfile, allow_rotation: bool) -> Self {
        if item.weight > profile.weight_capacity {
            OmissionReason::TooHeavyForContainer
        } else if !profile.can_hold(item, allow_rotation) {
            OmissionReason::DimensionsExceedContainer
        } else {
            OmissionReason::NoStablePosition
        }
    }
}

impl fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmissionReason::TooHeavyForContainer => {
                write!(f, "Item exceeds the container's weight capacity")
            }
            OmissionReason::DimensionsExceedContainer => {
                write!(f, "Item does not fit the container interior in any orientation")
            }
            OmissionReason::ExceedsEffectiveVolume => {
                write!(f, "Item volume exceeds the container's effective volume")
            }
            OmissionReason::NoStablePosition => {
                write!(f, "No supported, collision-free position found")
            }
            OmissionReason::ContainerLimitReached => {
                write!(f, "Container count limit reached before the item's container")
            }
        }
    }
}
