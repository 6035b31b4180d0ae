//! Bounding volumes
//!
//! Axis-aligned boxes and spheres in world space. Volumes are always built
//! from a live transform by the owner; nothing here is cached.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Overlap test. Touching faces count as contact.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Closest point inside the box to `point`
    #[inline]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point(sphere.center);
        closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    pub fn intersects(&self, other: &Sphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

/// Any volume an entity can occupy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Volume {
    Box(Aabb),
    Sphere(Sphere),
}

impl Volume {
    pub fn center(&self) -> Vec3 {
        match self {
            Volume::Box(b) => b.center(),
            Volume::Sphere(s) => s.center,
        }
    }

    /// Exact overlap test between any pair of volumes
    pub fn intersects(&self, other: &Volume) -> bool {
        match (self, other) {
            (Volume::Box(a), Volume::Box(b)) => a.intersects(b),
            (Volume::Box(a), Volume::Sphere(s)) | (Volume::Sphere(s), Volume::Box(a)) => {
                a.intersects_sphere(s)
            }
            (Volume::Sphere(a), Volume::Sphere(b)) => a.intersects(b),
        }
    }
}

/// Shape of an entity relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

impl Shape {
    /// Place the shape at `position`
    pub fn volume_at(&self, position: Vec3) -> Volume {
        match *self {
            Shape::Box { half_extents } => Volume::Box(Aabb::from_center(position, half_extents)),
            Shape::Sphere { radius } => Volume::Sphere(Sphere::new(position, radius)),
        }
    }

    /// Half size along each axis
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Shape::Box { half_extents } => half_extents,
            Shape::Sphere { radius } => Vec3::splat(radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_overlap() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center(Vec3::new(2.5, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_box_separated_on_one_axis_only() {
        // Overlap on x and y does not matter if z is apart
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center(Vec3::new(0.0, 0.0, -3.0), Vec3::ONE);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_box_sphere_corner() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        // Near the corner: inside the distance proxy but outside the box
        let s = Sphere::new(Vec3::new(1.6, 1.6, 0.0), 0.8);
        assert!(!a.intersects_sphere(&s));
        let s = Sphere::new(Vec3::new(1.5, 0.0, 0.0), 0.6);
        assert!(a.intersects_sphere(&s));
    }

    #[test]
    fn test_volume_dispatch_is_symmetric() {
        let b = Volume::Box(Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5)));
        let s = Volume::Sphere(Sphere::new(Vec3::new(0.0, 0.9, 0.0), 0.5));
        assert!(b.intersects(&s));
        assert!(s.intersects(&b));
    }

    #[test]
    fn test_shape_volume_at() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 2.0, 3.0),
        };
        let Volume::Box(aabb) = shape.volume_at(Vec3::new(0.0, 2.0, -10.0)) else {
            panic!("expected box");
        };
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, -13.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, -7.0));
    }
}
