//! Synthetic shipments for demonstrations and load tests.
//!
//! Items get a declared volume first; the footprint is drawn independently and
//! the height derived from both, so the generated boxes are plausible pallets
//! rather than uniform cubes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::Item;

/// Height above which a generated item is laid on its side.
pub const MAX_STANDING_HEIGHT: f64 = 2.3;

/// Value ranges and vocabularies for generated items.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoOptions {
    pub categories: Vec<String>,
    pub destinations: Vec<String>,
    /// Declared volume range in m³.
    pub volume: (f64, f64),
    /// Footprint width range in m.
    pub base_width: (f64, f64),
    /// Footprint length range in m.
    pub base_length: (f64, f64),
    /// Weight range in kg.
    pub weight: (f64, f64),
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            categories: [
                "Perishable_Refrigerated",
                "Dry_General",
                "Dry_Bulk",
                "Hazardous_Class9",
            ]
            .map(String::from)
            .to_vec(),
            destinations: ["Shanghai", "Rotterdam", "Los Angeles"]
                .map(String::from)
                .to_vec(),
            volume: (1.0, 4.0),
            base_width: (0.6, 1.0),
            base_length: (1.2, 2.0),
            weight: (200.0, 2500.0),
        }
    }
}

/// Generates `count` items.
///
/// The same `seed` always yields the same items; without a seed the generator
/// is seeded from the operating system.
///
/// # Examples
/// ```
/// use stowage_planner::demo::{DemoOptions, generate_items};
///
/// let a = generate_items(20, Some(7), &DemoOptions::default());
/// let b = generate_items(20, Some(7), &DemoOptions::default());
/// assert_eq!(a, b);
/// ```
pub fn generate_items(count: usize, seed: Option<u64>, options: &DemoOptions) -> Vec<Item> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..count)
        .map(|idx| generate_item(&mut rng, idx, options))
        .collect()
}

fn generate_item(rng: &mut StdRng, idx: usize, options: &DemoOptions) -> Item {
    let volume = round2(sample(rng, options.volume));
    let width = round2(sample(rng, options.base_width));
    let mut length = round2(sample(rng, options.base_length));
    let mut height = round2(volume / (width * length));
    if height > MAX_STANDING_HEIGHT {
        std::mem::swap(&mut height, &mut length);
    }
    let weight = round2(sample(rng, options.weight));

    let category = pick(rng, &options.categories);
    let destination = pick(rng, &options.destinations);

    Item::new(format!("DEMO-{:05}", idx + 1), (length, width, height), weight)
        .with_volume(volume)
        .with_name(format!("{} lot {}", category, idx + 1))
        .with_category(category)
        .with_destination(destination)
}

fn sample(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

fn pick(rng: &mut StdRng, choices: &[String]) -> String {
    if choices.is_empty() {
        return String::new();
    }
    choices[rng.gen_range(0..choices.len())].clone()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
