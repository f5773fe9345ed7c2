/// Entities: Wall, Player, Goal, plus the per-frame directional intent.
/// Walls and the goal are fixed once a layout is built; the player is the
/// only thing that moves.

use super::collision::Aabb;
use super::math::Vec3;

/// One of the four logical movement directions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
}

/// Held flags for each direction, sampled once per frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn held(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    /// -1, 0 or +1 along X. Left and Right together cancel.
    pub fn axis_x(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }

    /// -1, 0 or +1 along Z. Up is -Z (away from the camera).
    pub fn axis_z(&self) -> f32 {
        (self.down as i8 - self.up as i8) as f32
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// A static box obstacle. `extents` is the full size along each axis.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Wall {
    center: Vec3,
    extents: Vec3,
}

impl Wall {
    /// Build a wall, rejecting non-positive or non-finite extents.
    pub fn try_new(center: Vec3, extents: Vec3) -> Option<Self> {
        let valid = extents.iter().all(|e| e.is_finite() && *e > 0.0);
        if valid {
            Some(Wall { center, extents })
        } else {
            None
        }
    }

    /// Build a wall from known-good dimensions.
    ///
    /// # Panics
    /// If any extent is not strictly positive.
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        match Wall::try_new(center, extents) {
            Some(w) => w,
            None => panic!("wall extents must be strictly positive, got {extents:?}"),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_extents(self.center, self.extents)
    }
}

/// The maze is just its walls. Order only matters to renderers.
pub type Maze = Vec<Wall>;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Goal {
    pub position: Vec3,
    pub radius: f32,
}

impl Goal {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Goal { position, radius }
    }

    /// Strictly inside the goal sphere.
    pub fn reached_by(&self, point: &Vec3) -> bool {
        (point - self.position).norm() < self.radius
    }
}

/// The one moving body. Position and velocity are only written by
/// `sim::player::step` and by a session reset.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
}

impl Player {
    pub fn new(position: Vec3) -> Self {
        Player {
            position,
            velocity: Vec3::zeros(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Velocity intended on the last step (committed or not).
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub(crate) fn respawn(&mut self, at: Vec3) {
        self.position = at;
        self.velocity = Vec3::zeros();
    }
}
