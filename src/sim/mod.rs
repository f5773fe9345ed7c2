/// Simulation: per-frame controllers and the session state machine that
/// drives them. Time only enters through `GameSession::tick`.

pub mod camera;
pub mod event;
pub mod input;
pub mod level;
pub mod particles;
pub mod player;
pub mod session;
pub mod view;
