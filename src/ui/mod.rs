/// Terminal front end: key and pad sources feeding the session, and the
/// renderer reading it back.

pub mod gamepad;
pub mod input;
pub mod renderer;
