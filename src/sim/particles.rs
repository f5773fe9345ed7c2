/// Particle burst: a cosmetic cloud of rising points.
///
/// Points spawn uniformly inside a cube centered on the origin and climb a
/// fixed amount per frame. A point that passes the ceiling wraps back to the
/// floor, so the cloud sparkles until the session throws it away on reset.
/// There is no per-point lifetime.

use rand::Rng;

use crate::config::ParticleConfig;
use crate::domain::math::Vec3;

#[derive(Clone, Debug)]
pub struct ParticleBurst {
    origin: Vec3,
    points: Vec<Vec3>,
    rise: f32,
    ceiling: f32, // absolute y
    floor: f32,   // absolute y
}

impl ParticleBurst {
    pub fn spawn<R: Rng + ?Sized>(origin: Vec3, cfg: &ParticleConfig, rng: &mut R) -> Self {
        let half = cfg.spread * 0.5;
        let mut coord = |c: f32| if half > 0.0 && half.is_finite() { c + rng.gen_range(-half..=half) } else { c };
        let points = (0..cfg.count)
            .map(|_| Vec3::new(coord(origin.x), coord(origin.y), coord(origin.z)))
            .collect();

        ParticleBurst {
            origin,
            points,
            rise: cfg.rise,
            ceiling: origin.y + cfg.ceiling,
            floor: origin.y + cfg.floor,
        }
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        for p in &mut self.points {
            p.y += self.rise;
            if p.y > self.ceiling {
                p.y = self.floor;
            }
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::vec3;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn burst_at(origin: Vec3, seed: u64) -> ParticleBurst {
        let mut rng = StdRng::seed_from_u64(seed);
        ParticleBurst::spawn(origin, &ParticleConfig::default(), &mut rng)
    }

    #[test]
    fn spawn_fills_cube_around_origin() {
        let origin = vec3(21.0, 0.5, 0.0);
        let b = burst_at(origin, 1);
        assert_eq!(b.points().len(), 100);
        for p in b.points() {
            assert!((p - origin).amax() <= 0.5 + 1e-6, "{p:?} outside cube");
        }
        assert_eq!(b.origin(), origin);
    }

    #[test]
    fn same_seed_same_cloud() {
        let a = burst_at(vec3(0.0, 0.0, 0.0), 42);
        let b = burst_at(vec3(0.0, 0.0, 0.0), 42);
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn step_raises_every_point() {
        let mut b = burst_at(vec3(0.0, 0.0, 0.0), 3);
        let before: Vec<Vec3> = b.points().to_vec();
        b.step();
        for (old, new) in before.iter().zip(b.points()) {
            assert_relative_eq!(new.y, old.y + 0.02, epsilon = 1e-6);
            assert_eq!(new.x, old.x);
            assert_eq!(new.z, old.z);
        }
    }

    #[test]
    fn points_wrap_to_floor_past_ceiling() {
        let cfg = ParticleConfig { count: 1, spread: 0.0, rise: 0.6, ceiling: 1.0, floor: 0.0, seed: None };
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = ParticleBurst::spawn(vec3(0.0, 2.0, 0.0), &cfg, &mut rng);
        assert_eq!(b.points()[0].y, 2.0);

        b.step(); // 2.6
        assert_relative_eq!(b.points()[0].y, 2.6, epsilon = 1e-6);
        b.step(); // 3.2 > ceiling 3.0 → floor 2.0
        assert_eq!(b.points()[0].y, 2.0);
    }

    #[test]
    fn cloud_never_escapes_band() {
        let mut b = burst_at(vec3(0.0, 0.0, 0.0), 9);
        for _ in 0..500 {
            b.step();
        }
        for p in b.points() {
            assert!(p.y <= 2.0 + 1e-6 && p.y >= -0.5 - 1e-6);
        }
    }

    #[test]
    fn unbounded_spread_collapses_to_origin() {
        let cfg = ParticleConfig { count: 3, spread: f32::INFINITY, ..ParticleConfig::default() };
        let mut rng = StdRng::seed_from_u64(0);
        let origin = vec3(1.0, 0.5, -1.0);
        let b = ParticleBurst::spawn(origin, &cfg, &mut rng);
        assert!(b.points().iter().all(|p| *p == origin));
    }

    #[test]
    fn empty_burst_is_fine() {
        let cfg = ParticleConfig { count: 0, ..ParticleConfig::default() };
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = ParticleBurst::spawn(vec3(0.0, 0.0, 0.0), &cfg, &mut rng);
        b.step();
        assert!(b.points().is_empty());
    }
}
