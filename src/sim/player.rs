/// Player controller: one integration step per frame.
///
/// Processing order:
///   1. Intent → velocity (fixed per-frame speed per axis, no normalization)
///   2. Candidate = position + velocity
///   3. Goal check   (wins ties against walls)
///   4. Wall check   (closed AABB overlap, full stop on contact)
///   5. Commit
///
/// Steps 3 and 4 leave the position untouched; the session decides what
/// happens next from the returned `Outcome`.

use crate::config::MovementConfig;
use crate::domain::collision::{self, Aabb};
use crate::domain::entity::{Goal, InputState, Player, Wall};
use crate::domain::math::Vec3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    None,
    ReachedGoal,
    Collided,
}

/// X: Left −speed, Right +speed. Z: Up −speed, Down +speed.
/// Diagonals are not normalized.
pub fn intended_velocity(input: InputState, speed: f32) -> Vec3 {
    Vec3::new(input.axis_x() * speed, 0.0, input.axis_z() * speed)
}

pub fn step(
    player: &mut Player,
    input: InputState,
    walls: &[Wall],
    goal: &Goal,
    movement: &MovementConfig,
) -> Outcome {
    player.velocity = intended_velocity(input, movement.speed);
    let candidate = player.position + player.velocity;

    if goal.reached_by(&candidate) {
        return Outcome::ReachedGoal;
    }

    let body = Aabb::from_center_extents(candidate, movement.player_extent);
    if collision::intersects_any(&body, walls.iter().map(Wall::aabb)) {
        return Outcome::Collided;
    }

    player.position = candidate;
    Outcome::None
}
