//! Common types and traits for 3D geometry.
//!
//! Coordinates are container-local with the origin at the floor corner:
//! `x` runs along the container length, `y` is the vertical axis and `z`
//! runs along the container width.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for bound checks so that an item exactly as long as the container still fits.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Tolerance (in metres) for deciding that a box rests on the floor or on a top face.
pub const EPSILON_FLOOR: f64 = 0.01;

/// Tolerance (in metres) below which length and width count as equal, making rotation pointless.
pub const EPSILON_ROTATION: f64 = 0.01;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```
/// use stowage_planner::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let extent = Vec3::new(10.0, 20.0, 30.0);
/// let far_corner = position + extent;
/// assert_eq!(far_corner, Vec3::new(11.0, 22.0, 33.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (along the length)
    /// * `y` - Y component (vertical)
    /// * `z` - Z component (along the width)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Calculates the volume (product of all components).
    ///
    /// Useful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Calculates the base area (X × Z product, the footprint on the floor).
    #[inline]
    pub fn base_area(&self) -> f64 {
        self.x * self.z
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `container` - The outer vector (e.g., container interior)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

/// Trait for objects with 3D extent.
///
/// The returned vector is `(length, height, width)` in container axes.
pub trait Dimensional {
    /// Returns the extent of the object.
    fn dimensions(&self) -> Vec3;
}

/// Trait for objects with a position in 3D space.
pub trait Positioned {
    /// Returns the position (lower front left corner).
    fn position(&self) -> Vec3;
}

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Used for collision detection and support calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + extent)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and extent.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Creates a bounding box for anything that has both a position and an extent.
    #[inline]
    pub fn of<T: Positioned + Dimensional>(value: &T) -> Self {
        Self::from_position_and_dims(value.position(), value.dimensions())
    }

    /// Calculates the overlap length in one dimension.
    #[inline]
    pub fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Calculates the overlap area of both footprints (XZ plane).
    #[inline]
    pub fn overlap_area_xz(&self, other: &Self) -> f64 {
        let overlap_x = Self::overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x);
        let overlap_z = Self::overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z);
        overlap_x * overlap_z
    }

    /// Returns the bottom face height (Y minimum).
    #[inline]
    pub fn bottom_y(&self) -> f64 {
        self.min.y
    }

    /// Returns the top face height (Y maximum).
    #[inline]
    pub fn top_y(&self) -> f64 {
        self.max.y
    }

    /// Returns the extent (length, height, width).
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Footprint area of the box.
    #[inline]
    pub fn base_area(&self) -> f64 {
        self.dimensions().base_area()
    }
}

/// Validation functions shared by items and container profiles.
pub mod validation {

    /// Validates a measure that may be zero but never negative, NaN or infinite.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the measure for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_non_negative(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a strictly positive measure.
    pub fn validate_positive(value: f64, name: &str) -> Result<(), String> {
        validate_non_negative(value, name)?;
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }
}
