/// Axis-aligned bounding boxes.
///
/// Overlap uses closed intervals on every axis: two boxes that only share a
/// face, an edge or a corner still intersect. A move that would graze a wall
/// is therefore rejected.

use super::math::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box centered on `center` whose full size along each axis is `extents`.
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let half = extents * 0.5;
        Aabb {
            min: center - half,
            max: center + half,
        }
    }

    /// Closed-interval overlap on x, y and z.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Does the box cover `point` on the floor plane (x and z only)?
    /// Used by top-down views; the simulation itself never calls this.
    pub fn covers_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }
}

/// Does `body` overlap any of `boxes`?
pub fn intersects_any<I>(body: &Aabb, boxes: I) -> bool
where
    I: IntoIterator<Item = Aabb>,
{
    boxes.into_iter().any(|b| body.intersects(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::vec3;
    use approx::assert_relative_eq;

    fn unit_at(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::from_center_extents(vec3(x, y, z), vec3(1.0, 1.0, 1.0))
    }

    #[test]
    fn center_extents_are_full_sizes() {
        let b = Aabb::from_center_extents(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 4.0));
        assert_relative_eq!(b.min, vec3(-0.5, -0.5, -2.0));
        assert_relative_eq!(b.max, vec3(0.5, 0.5, 2.0));
        assert_relative_eq!(b.center(), vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn overlapping_boxes_intersect() {
        assert!(unit_at(0.0, 0.0, 0.0).intersects(&unit_at(0.5, 0.5, 0.5)));
    }

    #[test]
    fn touching_face_counts_as_intersection() {
        // a.max.x == b.min.x exactly, other axes aligned
        let a = unit_at(0.0, 0.0, 0.0);
        let b = unit_at(1.0, 0.0, 0.0);
        assert_eq!(a.max.x, b.min.x);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_corner_counts_as_intersection() {
        let a = unit_at(0.0, 0.0, 0.0);
        let b = unit_at(1.0, 1.0, 1.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn separated_on_one_axis_is_enough() {
        let a = unit_at(0.0, 0.0, 0.0);
        assert!(!a.intersects(&unit_at(1.01, 0.0, 0.0)));
        assert!(!a.intersects(&unit_at(0.0, -1.01, 0.0)));
        assert!(!a.intersects(&unit_at(0.0, 0.0, 1.01)));
    }

    #[test]
    fn containment_intersects() {
        let big = Aabb::from_center_extents(vec3(0.0, 0.0, 0.0), vec3(10.0, 10.0, 10.0));
        let small = unit_at(1.0, 2.0, 3.0);
        assert!(big.intersects(&small));
        assert!(small.intersects(&big));
    }

    #[test]
    fn intersection_is_symmetric() {
        let offsets = [-1.5, -1.0, -0.75, 0.0, 0.25, 1.0, 1.25];
        let sizes = [0.5, 1.0, 2.0];
        let origin = unit_at(0.0, 0.0, 0.0);
        for &dx in &offsets {
            for &dz in &offsets {
                for &s in &sizes {
                    let b = Aabb::from_center_extents(vec3(dx, 0.25, dz), vec3(s, s, s));
                    assert_eq!(
                        origin.intersects(&b),
                        b.intersects(&origin),
                        "asymmetric at dx={dx} dz={dz} size={s}"
                    );
                }
            }
        }
    }

    #[test]
    fn intersects_any_scans_all_boxes() {
        let body = unit_at(5.0, 0.0, 0.0);
        let far = vec![unit_at(0.0, 0.0, 0.0), unit_at(-5.0, 0.0, 0.0)];
        assert!(!intersects_any(&body, far.iter().copied()));

        let mut near = far;
        near.push(unit_at(5.5, 0.0, 0.0));
        assert!(intersects_any(&body, near));
    }

    #[test]
    fn covers_xz_ignores_height() {
        let b = unit_at(0.0, 100.0, 0.0);
        assert!(b.covers_xz(0.5, -0.5));
        assert!(!b.covers_xz(0.6, 0.0));
    }
}
