//! Geometric predicates for collision detection and vertical support.
//!
//! Both predicates work on axis-aligned boxes in container-local coordinates
//! (`y` is the vertical axis).

use crate::types::BoundingBox;

/// Checks whether two boxes overlap in 3D.
///
/// Uses Axis-Aligned Bounding Box (AABB) intersection. Boxes that merely touch
/// along a face do not overlap.
///
/// # Parameters
/// * `a` - First box
/// * `b` - Second box
///
/// # Returns
/// `true` if the open interiors intersect on all three axes, otherwise `false`
pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.min.x < b.max.x
        && a.max.x > b.min.x
        && a.min.y < b.max.y
        && a.max.y > b.min.y
        && a.min.z < b.max.z
        && a.max.z > b.min.z
}

/// Fraction of a candidate's base area that rests on top faces of placed boxes.
///
/// A candidate whose bottom lies within `epsilon` of the floor counts as fully
/// supported. Otherwise every placed box whose top face is within `epsilon` of
/// the candidate's bottom contributes its footprint overlap. A candidate with a
/// zero base area above the floor has no support.
///
/// # Parameters
/// * `candidate` - The box to test
/// * `placed` - Boxes already in the container
/// * `epsilon` - Height tolerance for floor and face contact
///
/// # Returns
/// A ratio in `[0.0, 1.0]` for non-overlapping supports
pub fn support_ratio<'a>(
    candidate: &BoundingBox,
    placed: impl IntoIterator<Item = &'a BoundingBox>,
    epsilon: f64,
) -> f64 {
    let bottom = candidate.bottom_y();
    if bottom.abs() <= epsilon {
        return 1.0;
    }

    let base_area = candidate.base_area();
    if base_area <= 0.0 {
        return 0.0;
    }

    let supported_area: f64 = placed
        .into_iter()
        .filter(|p| (p.top_y() - bottom).abs() < epsilon)
        .map(|p| candidate.overlap_area_xz(p))
        .sum();

    supported_area / base_area
}

/// Checks whether a candidate is supported by at least `min_ratio` of its base area.
///
/// The threshold is inclusive.
pub fn is_supported<'a>(
    candidate: &BoundingBox,
    placed: impl IntoIterator<Item = &'a BoundingBox>,
    epsilon: f64,
    min_ratio: f64,
) -> bool {
    support_ratio(candidate, placed, epsilon) >= min_ratio
}
