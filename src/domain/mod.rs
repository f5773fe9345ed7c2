/// Pure game data and geometry. Nothing in here knows about time,
/// sessions or the terminal.

pub mod cell;
pub mod collision;
pub mod entity;
pub mod math;
