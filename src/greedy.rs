//! First-fit-decreasing packing by aggregate volume.
//!
//! Used for the volume-only planning mode: bins carry no geometry, only the
//! accumulated declared volume, weight and the categories they hold. Volume
//! capacity is derated by a stowage-efficiency factor to leave room for the
//! slack real boxes need; the weight capacity is a hard limit.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{PlanError, Result};
use crate::model::{Item, OmittedItem, OmissionReason};

/// One volume-only bin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeBin {
    pub items: Vec<Item>,
    pub used_volume: f64,
    pub used_weight: f64,
    pub categories: BTreeSet<String>,
}

impl VolumeBin {
    fn seeded(item: Item) -> Self {
        let mut bin = Self::default();
        bin.add(item);
        bin
    }

    fn accepts(&self, item: &Item, volume_limit: f64, weight_limit: f64) -> bool {
        self.used_volume + item.volume <= volume_limit
            && self.used_weight + item.weight <= weight_limit
    }

    fn add(&mut self, item: Item) {
        self.used_volume += item.volume;
        self.used_weight += item.weight;
        self.categories.insert(item.category.clone());
        self.items.push(item);
    }
}

/// Result of one volume-only packing run.
#[derive(Clone, Debug, Default)]
pub struct VolumePackOutcome {
    pub bins: Vec<VolumeBin>,
    pub omitted: Vec<OmittedItem>,
}

/// First-fit-decreasing packer over declared item volumes.
#[derive(Clone, Copy, Debug)]
pub struct GreedyVolumePacker {
    efficiency: f64,
}

impl GreedyVolumePacker {
    pub const DEFAULT_EFFICIENCY: f64 = 0.88;

    /// Creates a packer with the given stowage-efficiency factor in `(0, 1]`.
    pub fn new(efficiency: f64) -> Result<Self> {
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(PlanError::InvalidConfiguration(format!(
                "stowage efficiency must be in (0, 1], got: {}",
                efficiency
            )));
        }
        Ok(Self { efficiency })
    }

    /// Capacity actually usable once the efficiency factor is applied.
    pub fn effective_capacity(&self, capacity: f64) -> f64 {
        capacity * self.efficiency
    }

    /// Packs `items` into bins of `volume_capacity` m³ and `weight_capacity` kg.
    ///
    /// Items are taken largest first (stable, so equal volumes keep their input
    /// order) and go into the first open bin with both volume and weight left.
    /// An item larger than the effective volume or heavier than the weight
    /// capacity on its own is omitted instead of opening a bin it would
    /// overflow.
    ///
    /// # Examples
    /// ```
    /// use stowage_planner::greedy::GreedyVolumePacker;
    /// use stowage_planner::model::Item;
    ///
    /// let items: Vec<Item> = (0..3)
    ///     .map(|i| Item::new(format!("p{i}"), (1.0, 1.0, 1.0), 100.0).with_volume(30.0))
    ///     .collect();
    /// let packer = GreedyVolumePacker::new(0.88).unwrap();
    /// let outcome = packer.pack(items, 76.4, 28_000.0);
    /// assert_eq!(outcome.bins.len(), 2);
    /// assert_eq!(outcome.bins[0].items.len(), 2);
    /// ```
    pub fn pack(
        &self,
        items: Vec<Item>,
        volume_capacity: f64,
        weight_capacity: f64,
    ) -> VolumePackOutcome {
        let limit = self.effective_capacity(volume_capacity);

        let mut sorted = items;
        sorted.sort_by(|a, b| b.volume.total_cmp(&a.volume));

        let mut outcome = VolumePackOutcome::default();
        for item in sorted {
            if item.volume > limit {
                debug!(
                    "📏 Item {} ({:.2} m³) exceeds effective capacity {:.2} m³",
                    item.id, item.volume, limit
                );
                outcome.omitted.push(OmittedItem {
                    item,
                    reason: OmissionReason::ExceedsEffectiveVolume,
                });
                continue;
            }
            if item.weight > weight_capacity {
                debug!(
                    "⚖️ Item {} ({:.1} kg) exceeds weight capacity {:.1} kg",
                    item.id, item.weight, weight_capacity
                );
                outcome.omitted.push(OmittedItem {
                    item,
                    reason: OmissionReason::TooHeavyForContainer,
                });
                continue;
            }

            let slot = outcome
                .bins
                .iter()
                .position(|bin| bin.accepts(&item, limit, weight_capacity));
            match slot {
                Some(idx) => outcome.bins[idx].add(item),
                None => outcome.bins.push(VolumeBin::seeded(item)),
            }
        }
        outcome
    }
}

impl Default for GreedyVolumePacker {
    fn default() -> Self {
        Self {
            efficiency: Self::DEFAULT_EFFICIENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAVY_CAP: f64 = 28_000.0;

    fn item(id: &str, volume: f64) -> Item {
        Item::new(id, (1.0, 1.0, 1.0), 10.0)
            .with_volume(volume)
            .with_category("Dry")
    }

    fn weighted(id: &str, volume: f64, weight: f64) -> Item {
        Item::new(id, (1.0, 1.0, 1.0), weight)
            .with_volume(volume)
            .with_category("Dry")
    }

    #[test]
    fn three_thirty_cube_items_need_two_bins() {
        let packer = GreedyVolumePacker::default();
        let outcome = packer.pack(
            vec![item("a", 30.0), item("b", 30.0), item("c", 30.0)],
            76.4,
            HEAVY_CAP,
        );

        assert!(outcome.omitted.is_empty());
        assert_eq!(outcome.bins.len(), 2);
        assert!((outcome.bins[0].used_volume - 60.0).abs() < 1e-9);
        assert_eq!(outcome.bins[1].items.len(), 1);
        assert_eq!(outcome.bins[1].items[0].id, "c");
    }

    #[test]
    fn largest_items_go_first_and_ties_keep_input_order() {
        let packer = GreedyVolumePacker::default();
        let outcome = packer.pack(
            vec![item("small", 1.0), item("big1", 5.0), item("big2", 5.0)],
            100.0,
            HEAVY_CAP,
        );

        let order: Vec<&str> = outcome.bins[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["big1", "big2", "small"]);
    }

    #[test]
    fn first_fit_backfills_earlier_bins() {
        let packer = GreedyVolumePacker::new(1.0).unwrap();
        let outcome = packer.pack(
            vec![item("a", 6.0), item("b", 6.0), item("c", 4.0), item("d", 3.0)],
            10.0,
            HEAVY_CAP,
        );

        assert_eq!(outcome.bins.len(), 2);
        let first: Vec<&str> = outcome.bins[0].items.iter().map(|i| i.id.as_str()).collect();
        let second: Vec<&str> = outcome.bins[1].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(second, vec!["b", "d"]);
    }

    #[test]
    fn oversized_item_is_omitted() {
        let packer = GreedyVolumePacker::default();
        let outcome = packer.pack(vec![item("huge", 70.0), item("ok", 10.0)], 76.4, HEAVY_CAP);

        assert_eq!(outcome.bins.len(), 1);
        assert_eq!(outcome.omitted.len(), 1);
        assert_eq!(outcome.omitted[0].item.id, "huge");
        assert_eq!(outcome.omitted[0].reason, OmissionReason::ExceedsEffectiveVolume);
    }

    #[test]
    fn bins_record_distinct_categories() {
        let packer = GreedyVolumePacker::default();
        let outcome = packer.pack(
            vec![
                item("a", 1.0),
                item("b", 1.0).with_category("Bulk"),
                item("c", 1.0),
            ],
            76.4,
            HEAVY_CAP,
        );
        let categories: Vec<&str> = outcome.bins[0].categories.iter().map(String::as_str).collect();
        assert_eq!(categories, vec!["Bulk", "Dry"]);
    }

    #[test]
    fn weight_opens_a_new_bin_when_volume_still_fits() {
        let packer = GreedyVolumePacker::default();
        let items: Vec<Item> = (0..3)
            .map(|i| weighted(&format!("w{i}"), 1.0, 12_000.0))
            .collect();

        let outcome = packer.pack(items, 76.4, HEAVY_CAP);
        assert!(outcome.omitted.is_empty());
        assert_eq!(outcome.bins.len(), 2);
        assert_eq!(outcome.bins[0].items.len(), 2);
        assert!((outcome.bins[0].used_weight - 24_000.0).abs() < 1e-9);
        for bin in &outcome.bins {
            assert!(bin.used_weight <= HEAVY_CAP);
        }
    }

    #[test]
    fn later_light_item_backfills_a_bin_left_by_weight() {
        let packer = GreedyVolumePacker::new(1.0).unwrap();
        let outcome = packer.pack(
            vec![
                weighted("a", 5.0, 900.0),
                weighted("b", 4.0, 900.0),
                weighted("c", 3.0, 50.0),
            ],
            100.0,
            1_000.0,
        );

        let first: Vec<&str> = outcome.bins[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(outcome.bins[1].items[0].id, "b");
    }

    #[test]
    fn item_heavier_than_capacity_is_omitted() {
        let packer = GreedyVolumePacker::default();
        let outcome = packer.pack(
            vec![weighted("anvil", 1.0, 30_000.0), item("ok", 1.0)],
            76.4,
            HEAVY_CAP,
        );

        assert_eq!(outcome.bins.len(), 1);
        assert_eq!(outcome.bins[0].items[0].id, "ok");
        assert_eq!(outcome.omitted.len(), 1);
        assert_eq!(outcome.omitted[0].item.id, "anvil");
        assert_eq!(outcome.omitted[0].reason, OmissionReason::TooHeavyForContainer);
    }

    #[test]
    fn invalid_efficiency_is_rejected() {
        assert!(GreedyVolumePacker::new(0.0).is_err());
        assert!(GreedyVolumePacker::new(1.2).is_err());
        assert!(GreedyVolumePacker::new(f64::NAN).is_err());
        assert!(GreedyVolumePacker::new(1.0).is_ok());
    }
}
