//! Grouping of items into compatibility pools and dispatch to the packers.
//!
//! Items are partitioned by destination and compatibility class, every pool is
//! packed independently (in parallel) and the resulting fleets are flattened
//! into one labelled manifest.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{PlanError, Result};
use crate::greedy::GreedyVolumePacker;
use crate::model::{ContainerProfile, Item, OmissionReason, OmittedItem, PackedContainer};
use crate::packer::{PackingMode, PoolOutcome, packer_for};
use crate::placer::PlacementConfig;

/// Share of the weight capacity from which a container is flagged as at its weight limit.
pub const MAX_WEIGHT_FLAG_RATIO: f64 = 0.95;

/// Label used when a container holds more than one category.
pub const MIXED_LABEL: &str = "MIXED";

/// Container family a pool is packed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileClass {
    Refrigerated,
    Standard,
}

impl ProfileClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileClass::Refrigerated => "REFRIGERATED",
            ProfileClass::Standard => "DRY",
        }
    }
}

/// How fine-grained the pools are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pooling {
    /// One pool per destination and category.
    #[default]
    Category,
    /// One pool per destination and profile class; dry categories share containers.
    Profile,
}

impl FromStr for Pooling {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(Pooling::Category),
            "profile" | "pool" => Ok(Pooling::Profile),
            other => Err(format!("unknown pooling strategy '{}'", other)),
        }
    }
}

/// The two container profiles and the categories that need refrigeration.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileCatalog {
    pub refrigerated: ContainerProfile,
    pub standard: ContainerProfile,
    pub refrigerated_categories: BTreeSet<String>,
}

impl ProfileCatalog {
    pub const DEFAULT_REFRIGERATED_CATEGORY: &'static str = "Perishable_Refrigerated";

    pub fn class_of(&self, category: &str) -> ProfileClass {
        if self.refrigerated_categories.contains(category) {
            ProfileClass::Refrigerated
        } else {
            ProfileClass::Standard
        }
    }

    pub fn profile(&self, class: ProfileClass) -> &ContainerProfile {
        match class {
            ProfileClass::Refrigerated => &self.refrigerated,
            ProfileClass::Standard => &self.standard,
        }
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self {
            refrigerated: ContainerProfile::refrigerated(),
            standard: ContainerProfile::high_cube(),
            refrigerated_categories: BTreeSet::from([
                Self::DEFAULT_REFRIGERATED_CATEGORY.to_string(),
            ]),
        }
    }
}

/// Parameters of a planning run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanningConfig {
    pub mode: PackingMode,
    pub pooling: Pooling,
    /// Upper bound on returned containers; later containers are dropped and their items omitted.
    pub max_containers: usize,
    /// Stowage-efficiency factor for volume-only packing.
    pub efficiency: f64,
    pub catalog: ProfileCatalog,
}

impl PlanningConfig {
    pub const DEFAULT_MAX_CONTAINERS: usize = 1000;

    pub fn validate(&self) -> Result<()> {
        if self.max_containers == 0 {
            return Err(PlanError::InvalidConfiguration(
                "max_containers must be at least 1".to_string(),
            ));
        }
        GreedyVolumePacker::new(self.efficiency)?;
        for profile in [&self.catalog.refrigerated, &self.catalog.standard] {
            ContainerProfile::new(
                profile.kind.clone(),
                (profile.length, profile.width, profile.height),
                profile.volume_capacity,
                profile.weight_capacity,
            )?;
        }
        Ok(())
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            mode: PackingMode::default(),
            pooling: Pooling::default(),
            max_containers: Self::DEFAULT_MAX_CONTAINERS,
            efficiency: GreedyVolumePacker::DEFAULT_EFFICIENCY,
            catalog: ProfileCatalog::default(),
        }
    }
}

/// Grouping key of a pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub destination: String,
    /// Category name, or the profile class name when pooling by profile.
    pub compatibility: String,
    pub profile_class: ProfileClass,
}

/// Items sharing one pool key, in input order.
#[derive(Clone, Debug)]
pub struct Pool {
    pub key: PoolKey,
    pub items: Vec<Item>,
}

/// Partitions `items` into pools, ordered by first appearance of each key.
pub fn partition(items: Vec<Item>, catalog: &ProfileCatalog, pooling: Pooling) -> Vec<Pool> {
    let mut index: HashMap<PoolKey, usize> = HashMap::new();
    let mut pools: Vec<Pool> = Vec::new();

    for item in items {
        let profile_class = catalog.class_of(&item.category);
        let compatibility = match pooling {
            Pooling::Category => item.category.clone(),
            Pooling::Profile => profile_class.as_str().to_string(),
        };
        let key = PoolKey {
            destination: item.destination.clone(),
            compatibility,
            profile_class,
        };

        match index.get(&key) {
            Some(&slot) => pools[slot].items.push(item),
            None => {
                index.insert(key.clone(), pools.len());
                pools.push(Pool {
                    key,
                    items: vec![item],
                });
            }
        }
    }
    pools
}

/// Human readable container type, e.g. `High Cube - Dry_General #2 -> Rotterdam`.
pub fn container_label(container: &PackedContainer, key: &PoolKey, fleet_index: usize) -> String {
    let categories = container.categories();
    let class = match categories.len() {
        0 => key.compatibility.as_str(),
        1 => categories.first().copied().unwrap_or(MIXED_LABEL),
        _ => MIXED_LABEL,
    };
    let weight_flag = if container.used_weight
        >= container.profile.weight_capacity * MAX_WEIGHT_FLAG_RATIO
    {
        " (MAX WEIGHT)"
    } else {
        ""
    };
    format!(
        "{} - {}{} #{} -> {}",
        container.profile.kind, class, weight_flag, fleet_index, key.destination
    )
}

/// Result of a planning run.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    pub containers: Vec<PackedContainer>,
    pub omitted: Vec<OmittedItem>,
    /// Containers dropped because of `max_containers`.
    pub truncated: usize,
}

impl Manifest {
    /// Indicates whether every item was packed.
    pub fn is_complete(&self) -> bool {
        self.omitted.is_empty()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn packed_item_count(&self) -> usize {
        self.containers.iter().map(PackedContainer::item_count).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.containers.iter().map(|c| c.used_volume).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.containers.iter().map(|c| c.used_weight).sum()
    }

    /// Average volume utilisation across containers in percent.
    pub fn average_volume_utilization(&self) -> f64 {
        if self.containers.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .containers
            .iter()
            .map(PackedContainer::volume_utilization_pct)
            .sum();
        sum / self.containers.len() as f64
    }
}

/// Plans the container fleet for `items`.
///
/// Validates the input, partitions it into pools, packs each pool with the
/// strategy selected by `planning.mode` and flattens the fleets into a
/// labelled manifest. Items that cannot be packed are listed in
/// `Manifest::omitted`; nothing is dropped silently.
///
/// # Errors
/// `PlanError::NoItems` for an empty list, `PlanError::InvalidItem` for
/// negative or non-finite measures, `PlanError::InvalidConfiguration` /
/// `PlanError::InvalidProfile` for unusable planning parameters.
pub fn plan_shipment(
    items: Vec<Item>,
    planning: &PlanningConfig,
    placement: &PlacementConfig,
) -> Result<Manifest> {
    planning.validate()?;
    if items.is_empty() {
        return Err(PlanError::NoItems);
    }
    for item in &items {
        item.validate()?;
    }

    let greedy = GreedyVolumePacker::new(planning.efficiency)?;
    let packer = packer_for(planning.mode, *placement, greedy);
    let item_count = items.len();
    let pools = partition(items, &planning.catalog, planning.pooling);
    let pool_count = pools.len();

    let outcomes: Vec<(PoolKey, PoolOutcome)> = pools
        .into_par_iter()
        .map(|pool| {
            let profile = planning.catalog.profile(pool.key.profile_class);
            let outcome = packer.pack_pool(pool.items, profile);
            (pool.key, outcome)
        })
        .collect();

    let mut manifest = Manifest::default();
    for (key, outcome) in outcomes {
        for (idx, container) in outcome.containers.into_iter().enumerate() {
            let label = container_label(&container, &key, idx + 1);
            manifest.containers.push(container.with_label(label));
        }
        manifest.omitted.extend(outcome.omitted);
    }

    if manifest.containers.len() > planning.max_containers {
        let dropped: Vec<PackedContainer> = manifest
            .containers
            .drain(planning.max_containers..)
            .collect();
        manifest.truncated = dropped.len();
        warn!(
            "✂️ Container limit {} reached: {} containers dropped",
            planning.max_containers, manifest.truncated
        );
        manifest.omitted.extend(
            dropped
                .into_iter()
                .flat_map(|c| c.items)
                .map(|stowed| OmittedItem {
                    item: stowed.item,
                    reason: OmissionReason::ContainerLimitReached,
                }),
        );
    }

    info!(
        "✅ Planned {} items in {} pools ({} mode): {} containers, {} omitted",
        item_count,
        pool_count,
        packer.mode().as_str(),
        manifest.container_count(),
        manifest.omitted.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, category: &str, destination: &str) -> Item {
        Item::new(id, (1.0, 1.0, 1.0), 100.0)
            .with_category(category)
            .with_destination(destination)
    }

    #[test]
    fn partition_keeps_first_seen_order() {
        let items = vec![
            item("1", "Dry_General", "Rotterdam"),
            item("2", "Perishable_Refrigerated", "Rotterdam"),
            item("3", "Dry_General", "Shanghai"),
            item("4", "Dry_General", "Rotterdam"),
        ];
        let pools = partition(items, &ProfileCatalog::default(), Pooling::Category);

        let keys: Vec<(&str, &str)> = pools
            .iter()
            .map(|p| (p.key.destination.as_str(), p.key.compatibility.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Rotterdam", "Dry_General"),
                ("Rotterdam", "Perishable_Refrigerated"),
                ("Shanghai", "Dry_General"),
            ]
        );
        let ids: Vec<&str> = pools[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(pools[1].key.profile_class, ProfileClass::Refrigerated);
    }

    #[test]
    fn profile_pooling_merges_dry_categories() {
        let items = vec![
            item("1", "Dry_General", "Rotterdam"),
            item("2", "Dry_Bulk", "Rotterdam"),
            item("3", "Perishable_Refrigerated", "Rotterdam"),
        ];
        let pools = partition(items, &ProfileCatalog::default(), Pooling::Profile);
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].key.compatibility, "DRY");
        assert_eq!(pools[0].items.len(), 2);
        assert_eq!(pools[1].key.compatibility, "REFRIGERATED");
    }

    #[test]
    fn labels_name_single_category_or_mixed() {
        let key = PoolKey {
            destination: "Rotterdam".to_string(),
            compatibility: "DRY".to_string(),
            profile_class: ProfileClass::Standard,
        };
        let mut single = PackedContainer::new(ContainerProfile::high_cube());
        single.push(crate::model::StowedItem::unplaced(item("1", "Dry_General", "Rotterdam")));
        assert_eq!(
            container_label(&single, &key, 1),
            "High Cube - Dry_General #1 -> Rotterdam"
        );

        let mut mixed = single.clone();
        mixed.push(crate::model::StowedItem::unplaced(item("2", "Dry_Bulk", "Rotterdam")));
        assert_eq!(
            container_label(&mixed, &key, 2),
            "High Cube - MIXED #2 -> Rotterdam"
        );
    }

    #[test]
    fn labels_flag_containers_at_weight_limit() {
        let key = PoolKey {
            destination: "Shanghai".to_string(),
            compatibility: "Dry_General".to_string(),
            profile_class: ProfileClass::Standard,
        };
        let mut heavy = PackedContainer::new(ContainerProfile::high_cube());
        heavy.push(crate::model::StowedItem::unplaced(
            Item::new("h", (1.0, 1.0, 1.0), 27_000.0).with_category("Dry_General"),
        ));
        assert_eq!(
            container_label(&heavy, &key, 1),
            "High Cube - Dry_General (MAX WEIGHT) #1 -> Shanghai"
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = plan_shipment(Vec::new(), &PlanningConfig::default(), &PlacementConfig::default())
            .unwrap_err();
        assert_eq!(err, PlanError::NoItems);
    }

    #[test]
    fn invalid_item_is_rejected_before_packing() {
        let items = vec![
            item("ok", "Dry_General", "Rotterdam"),
            Item::new("bad", (1.0, 1.0, 1.0), -5.0),
        ];
        let err = plan_shipment(items, &PlanningConfig::default(), &PlacementConfig::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidItem { ref id, .. } if id == "bad"));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let planning = PlanningConfig {
            max_containers: 0,
            ..PlanningConfig::default()
        };
        let err = plan_shipment(
            vec![item("1", "Dry_General", "Rotterdam")],
            &planning,
            &PlacementConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidConfiguration(_)));
    }

    #[test]
    fn refrigerated_items_use_the_refrigerated_profile() {
        let items = vec![
            item("cold", "Perishable_Refrigerated", "Rotterdam"),
            item("dry", "Dry_General", "Rotterdam"),
        ];
        let manifest = plan_shipment(
            items,
            &PlanningConfig::default(),
            &PlacementConfig::default(),
        )
        .unwrap();

        assert_eq!(manifest.container_count(), 2);
        assert_eq!(manifest.containers[0].profile.kind, "Refrigerated");
        assert_eq!(manifest.containers[1].profile.kind, "High Cube");
        assert_eq!(
            manifest.containers[0].label.as_deref(),
            Some("Refrigerated - Perishable_Refrigerated #1 -> Rotterdam")
        );
    }

    #[test]
    fn container_limit_moves_items_to_omitted() {
        // Each item fills a whole high cube by weight.
        let items: Vec<Item> = (0..4)
            .map(|i| {
                Item::new(format!("w{i}"), (1.0, 1.0, 1.0), 20_000.0)
                    .with_category("Dry_General")
                    .with_destination("Rotterdam")
            })
            .collect();
        let planning = PlanningConfig {
            max_containers: 2,
            ..PlanningConfig::default()
        };

        let manifest = plan_shipment(items, &planning, &PlacementConfig::default()).unwrap();
        assert_eq!(manifest.container_count(), 2);
        assert_eq!(manifest.truncated, 2);
        assert_eq!(manifest.omitted.len(), 2);
        assert!(
            manifest
                .omitted
                .iter()
                .all(|o| o.reason == OmissionReason::ContainerLimitReached)
        );
        assert_eq!(manifest.packed_item_count() + manifest.omitted.len(), 4);
    }
}
