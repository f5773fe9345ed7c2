/// Vector type shared by the whole simulation.

use nalgebra::Vector3;

/// World-space point or direction. `y` is up, the maze floor is the XZ plane.
pub type Vec3 = Vector3<f32>;

/// Shorthand constructor, keeps layout tables readable.
#[inline]
pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}
