//! Repeated spatial placement until a pool is exhausted.

use tracing::{debug, warn};

use crate::model::{ContainerProfile, Item, OmissionReason, OmittedItem, PackedContainer};
use crate::packer::PoolOutcome;
use crate::placer::{PlacementConfig, SpatialPlacer};

/// Fills fresh containers of one profile, wave after wave.
#[derive(Clone, Copy, Debug, Default)]
pub struct FleetOptimizer {
    placer: SpatialPlacer,
}

impl FleetOptimizer {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            placer: SpatialPlacer::new(config),
        }
    }

    /// Packs all `items` into as many containers of `profile` as needed.
    ///
    /// Every iteration hands the pending items to the placer against an empty
    /// container; the leftovers become the next iteration's input. The loop stops
    /// when nothing is pending or when an empty container accepts nothing, in
    /// which case the remaining items are reported as omitted.
    pub fn optimize(&self, items: Vec<Item>, profile: &ContainerProfile) -> PoolOutcome {
        let mut outcome = PoolOutcome::default();
        let mut pending = items;
        let allow_rotation = self.placer.config().allow_item_rotation;

        while !pending.is_empty() {
            let wave = self
                .placer
                .place_wave(pending, profile, 0.0, profile.weight_capacity);

            if wave.placed.is_empty() {
                warn!(
                    "⚠️ {} items omitted: they do not fit an empty {} container",
                    wave.leftovers.len(),
                    profile.kind
                );
                outcome
                    .omitted
                    .extend(wave.leftovers.into_iter().map(|item| OmittedItem {
                        reason: OmissionReason::for_unplaceable(&item, profile, allow_rotation),
                        item,
                    }));
                break;
            }

            let mut container = PackedContainer::new(profile.clone());
            for stowed in wave.placed {
                container.push(stowed);
            }
            debug!(
                "🚚 Container {} sealed: {} items, {:.2} m³, {:.1} kg",
                outcome.containers.len() + 1,
                container.item_count(),
                container.used_volume,
                container.used_weight
            );
            outcome.containers.push(container);
            pending = wave.leftovers;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(dims: (f64, f64, f64), max_weight: f64) -> ContainerProfile {
        ContainerProfile::new("Test", dims, dims.0 * dims.1 * dims.2, max_weight).unwrap()
    }

    #[test]
    fn opens_new_containers_when_weight_is_exhausted() {
        let items = vec![
            Item::new("1", (1.0, 1.0, 1.0), 300.0),
            Item::new("2", (1.0, 1.0, 1.0), 300.0),
            Item::new("3", (1.0, 1.0, 1.0), 300.0),
        ];

        let outcome = FleetOptimizer::default().optimize(items, &profile((2.0, 2.0, 2.0), 400.0));
        assert_eq!(outcome.containers.len(), 3);
        assert!(outcome.omitted.is_empty());
        for container in &outcome.containers {
            assert_eq!(container.item_count(), 1);
            assert!(container.used_weight <= 400.0);
        }
    }

    #[test]
    fn opens_new_containers_when_space_is_exhausted() {
        let items: Vec<Item> = (0..5)
            .map(|i| Item::new(format!("c{i}"), (1.0, 1.0, 1.0), 1.0))
            .collect();

        let outcome = FleetOptimizer::default().optimize(items, &profile((2.0, 1.0, 1.0), 100.0));
        let counts: Vec<usize> = outcome.containers.iter().map(|c| c.item_count()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert!(outcome.omitted.is_empty());
    }

    #[test]
    fn unplaceable_items_are_reported_not_dropped() {
        let items = vec![
            Item::new("ok", (1.0, 1.0, 1.0), 10.0),
            Item::new("too_heavy", (1.0, 1.0, 1.0), 500.0),
            Item::new("too_big", (5.0, 1.0, 1.0), 10.0),
        ];

        let outcome = FleetOptimizer::default().optimize(items, &profile((2.0, 2.0, 2.0), 100.0));
        assert_eq!(outcome.containers.len(), 1);
        assert_eq!(outcome.omitted.len(), 2);

        let reason_of = |id: &str| {
            outcome
                .omitted
                .iter()
                .find(|o| o.item.id == id)
                .map(|o| o.reason)
        };
        assert_eq!(reason_of("too_heavy"), Some(OmissionReason::TooHeavyForContainer));
        assert_eq!(reason_of("too_big"), Some(OmissionReason::DimensionsExceedContainer));
    }

    #[test]
    fn sideways_item_without_rotation_exceeds_dimensions() {
        let fixed =
            FleetOptimizer::new(PlacementConfig::builder().allow_item_rotation(false).build());
        let items = vec![Item::new("sideways", (1.0, 2.0, 1.0), 10.0)];

        let outcome = fixed.optimize(items.clone(), &profile((2.0, 1.0, 1.0), 100.0));
        assert!(outcome.containers.is_empty());
        assert_eq!(outcome.omitted.len(), 1);
        assert_eq!(outcome.omitted[0].reason, OmissionReason::DimensionsExceedContainer);

        let turning = FleetOptimizer::default().optimize(items, &profile((2.0, 1.0, 1.0), 100.0));
        assert_eq!(turning.containers.len(), 1);
        assert!(turning.omitted.is_empty());
    }

    #[test]
    fn container_totals_use_declared_volume() {
        let items = vec![
            Item::new("a", (1.0, 1.0, 1.0), 10.0).with_volume(0.8),
            Item::new("b", (1.0, 1.0, 1.0), 15.0).with_volume(0.7),
        ];

        let outcome = FleetOptimizer::default().optimize(items, &profile((2.0, 1.0, 1.0), 100.0));
        assert_eq!(outcome.containers.len(), 1);
        let container = &outcome.containers[0];
        assert!((container.used_volume - 1.5).abs() < 1e-9);
        assert!((container.used_weight - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let outcome = FleetOptimizer::default().optimize(Vec::new(), &profile((1.0, 1.0, 1.0), 1.0));
        assert!(outcome.containers.is_empty());
        assert!(outcome.omitted.is_empty());
    }
}
