/// Input state tracker.
///
/// Turns key-down / key-up events into persistent per-direction held flags.
/// Events can arrive at any point between frames; the session reads one
/// `snapshot()` per frame so a frame never sees a half-applied update.
///
/// Keys are host key names (`"ArrowUp"`, `"w"`, `"DPadLeft"`, ...).
/// Names without a binding are ignored.

use std::collections::HashMap;

use crate::config::KeyConfig;
use crate::domain::entity::{Direction, InputState};

/// Key name → direction table.
#[derive(Clone, Debug, Default)]
pub struct KeyBindings {
    map: HashMap<String, Direction>,
}

impl KeyBindings {
    pub fn new() -> Self {
        KeyBindings { map: HashMap::with_capacity(16) }
    }

    pub fn from_config(cfg: &KeyConfig) -> Self {
        let mut b = KeyBindings::new();
        for (dir, names) in [
            (Direction::Up, &cfg.up),
            (Direction::Down, &cfg.down),
            (Direction::Left, &cfg.left),
            (Direction::Right, &cfg.right),
        ] {
            for name in names {
                b.bind(name, dir);
            }
        }
        b
    }

    /// Later bindings for the same name win.
    pub fn bind(&mut self, key: &str, dir: Direction) {
        self.map.insert(key.to_string(), dir);
    }

    pub fn direction(&self, key: &str) -> Option<Direction> {
        self.map.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub struct InputTracker {
    bindings: KeyBindings,
    held: InputState,
}

impl InputTracker {
    pub fn new(bindings: KeyBindings) -> Self {
        InputTracker { bindings, held: InputState::default() }
    }

    /// Returns false for an unbound key (nothing changes).
    pub fn key_down(&mut self, key: &str) -> bool {
        self.apply(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.apply(key, false)
    }

    /// Copy of the current flags. Take exactly one per frame.
    pub fn snapshot(&self) -> InputState {
        self.held
    }

    pub fn release_all(&mut self) {
        self.held = InputState::default();
    }

    // ── Internal ──

    fn apply(&mut self, key: &str, held: bool) -> bool {
        match self.bindings.direction(key) {
            Some(dir) => {
                self.held.set(dir, held);
                true
            }
            None => {
                log::trace!("unbound key {key:?} ignored");
                false
            }
        }
    }
}
