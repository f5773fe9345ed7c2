/// What the renderer gets to see.
///
/// `SceneLayout` is static for the life of a session and is read once;
/// `FrameView` is rebuilt every frame and borrows from the session.

use crate::domain::entity::{Goal, Wall};
use crate::domain::math::Vec3;

use super::camera::CameraPose;
use super::session::{RoundResult, SessionState};

#[derive(Clone, Copy, Debug)]
pub struct SceneLayout<'a> {
    pub walls: &'a [Wall],
    pub goal: Goal,
    pub start: Vec3,
    pub player_extent: Vec3,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub player: Vec3,
    pub camera: CameraPose,
    /// Empty when no burst is active.
    pub particles: &'a [Vec3],
    pub state: SessionState,
    pub result: Option<RoundResult>,
    pub round: u64,
}

impl FrameView<'_> {
    /// HUD banner text, if any.
    pub fn banner(&self) -> Option<String> {
        self.result.map(|r| r.to_string())
    }
}
