/// Events emitted by the session.
/// The host consumes these for logging and HUD flashes.

use crate::domain::math::Vec3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResetReason {
    Timer,
    Command,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Started,
    GoalReached { at: Vec3 },
    Collided { at: Vec3 },
    RoundReset { round: u64, reason: ResetReason },
    /// A deferred reset from an earlier round came due and was dropped.
    StaleResetIgnored { scheduled_for: u64 },
    Stopped,
}
