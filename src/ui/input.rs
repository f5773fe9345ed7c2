/// Terminal key source.
///
/// Turns crossterm key events into `KeyTransition`s named the way the
/// session's bindings expect ("ArrowUp", "w", "Enter", ...). Each physical
/// key reports one Down when it becomes held and one Up when it is released.
///
/// Release detection:
///   - With keyboard enhancement (see `KeyboardCapture`) the terminal sends
///     real Release events and they are honored.
///   - Otherwise a key counts as released once no Press/Repeat has arrived
///     for `HOLD_TIMEOUT`. Auto-repeat keeps a held key alive.
///
/// Transitions are applied as soon as they are drained, but the session
/// samples input only once per tick. A press and release that both land
/// between two ticks cancel out, so a tap shorter than one frame does not
/// move the player.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum KeyTransition {
    Down(String),
    Up(String),
}

pub struct KeySource {
    /// Timestamp of last Press/Repeat event for each held key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that became held during the most recent drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw events from the most recent drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    transitions: Vec<KeyTransition>,

    honor_release: bool,
}

impl KeySource {
    pub fn new(honor_release: bool) -> Self {
        KeySource {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            transitions: Vec::with_capacity(8),
            honor_release,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before the session tick.
    pub fn drain_events(&mut self) -> io::Result<()> {
        self.begin_frame();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.feed(key, Instant::now());
            }
        }
        self.expire(Instant::now());
        Ok(())
    }

    /// Transitions produced by the last drain, oldest first.
    pub fn take_transitions(&mut self) -> Vec<KeyTransition> {
        std::mem::take(&mut self.transitions)
    }

    /// Was this key freshly pressed during the last drain? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Forget every held key, reporting an Up for each. A key that is still
    /// down comes back as a fresh Down on its next Repeat.
    pub fn release_all(&mut self) {
        for code in self.last_active.drain().map(|(c, _)| c).collect::<Vec<_>>() {
            if let Some(name) = key_name(code) {
                self.transitions.push(KeyTransition::Up(name));
            }
        }
    }

    // ── Internal ──

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn feed(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                if self.last_active.remove(&key.code).is_some() {
                    if let Some(name) = key_name(key.code) {
                        self.transitions.push(KeyTransition::Up(name));
                    }
                }
            }
            // Unconfirmed enhancement: rely on the timeout instead.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.last_active.insert(key.code, now).is_some();
                if !was_held {
                    self.fresh_presses.push(key.code);
                    if let Some(name) = key_name(key.code) {
                        self.transitions.push(KeyTransition::Down(name));
                    }
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        let mut expired = Vec::new();
        self.last_active.retain(|code, t| {
            let alive = now.duration_since(*t) < HOLD_TIMEOUT;
            if !alive {
                expired.push(*code);
            }
            alive
        });
        for code in expired {
            if let Some(name) = key_name(code) {
                self.transitions.push(KeyTransition::Up(name));
            }
        }
    }
}

/// Binding name for a terminal key code, `None` for keys the game never binds.
pub fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Enter => "Enter",
        KeyCode::Esc => "Escape",
        KeyCode::Tab => "Tab",
        KeyCode::Backspace => "Backspace",
        KeyCode::Char(' ') => "Space",
        KeyCode::Char(c) => return Some(c.to_string()),
        _ => return None,
    };
    Some(name.to_string())
}

// ── Keyboard enhancement guard ──

/// Asks the terminal for Press/Release reporting for as long as it lives.
/// Falls back silently when the terminal can't do it.
pub struct KeyboardCapture {
    enhanced: bool,
}

impl KeyboardCapture {
    /// Call after raw mode is on.
    pub fn acquire() -> Self {
        let supported = terminal::supports_keyboard_enhancement().unwrap_or(false);
        let enhanced = supported
            && execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        log::info!("keyboard enhancement: {}", if enhanced { "on" } else { "off (timeout release)" });
        KeyboardCapture { enhanced }
    }

    pub fn reports_release(&self) -> bool {
        self.enhanced
    }
}

impl Drop for KeyboardCapture {
    fn drop(&mut self) {
        if self.enhanced {
            let mut out = io::stdout();
            let _ = execute!(out, PopKeyboardEnhancementFlags);
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn names_match_bindings() {
        assert_eq!(key_name(KeyCode::Up).as_deref(), Some("ArrowUp"));
        assert_eq!(key_name(KeyCode::Char('w')).as_deref(), Some("w"));
        assert_eq!(key_name(KeyCode::Char(' ')).as_deref(), Some("Space"));
        assert_eq!(key_name(KeyCode::F(5)), None);
    }

    #[test]
    fn repeat_does_not_emit_second_down() {
        let mut src = KeySource::new(true);
        let t0 = Instant::now();
        src.feed(press(KeyCode::Left), t0);
        src.feed(KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Repeat), t0);
        assert_eq!(src.take_transitions(), vec![KeyTransition::Down("ArrowLeft".into())]);
        assert!(src.was_pressed(KeyCode::Left));
    }

    #[test]
    fn honored_release_emits_up() {
        let mut src = KeySource::new(true);
        let t0 = Instant::now();
        src.feed(press(KeyCode::Char('d')), t0);
        src.feed(release(KeyCode::Char('d')), t0);
        assert_eq!(
            src.take_transitions(),
            vec![KeyTransition::Down("d".into()), KeyTransition::Up("d".into())]
        );
    }

    #[test]
    fn timeout_release_without_enhancement() {
        let mut src = KeySource::new(false);
        let t0 = Instant::now();
        src.feed(press(KeyCode::Right), t0);
        src.feed(release(KeyCode::Right), t0); // ignored
        src.expire(t0 + Duration::from_millis(50));
        assert_eq!(src.take_transitions(), vec![KeyTransition::Down("ArrowRight".into())]);

        src.expire(t0 + HOLD_TIMEOUT + Duration::from_millis(1));
        assert_eq!(src.take_transitions(), vec![KeyTransition::Up("ArrowRight".into())]);
    }

    #[test]
    fn release_all_reports_held_keys() {
        let mut src = KeySource::new(true);
        src.feed(press(KeyCode::Up), Instant::now());
        src.take_transitions();
        src.release_all();
        assert_eq!(src.take_transitions(), vec![KeyTransition::Up("ArrowUp".into())]);
    }

    #[test]
    fn repeat_after_release_all_is_a_fresh_down() {
        let mut src = KeySource::new(true);
        let t0 = Instant::now();
        src.feed(press(KeyCode::Right), t0);
        src.release_all();
        src.take_transitions();

        src.feed(KeyEvent::new_with_kind(KeyCode::Right, KeyModifiers::NONE, KeyEventKind::Repeat), t0);
        assert_eq!(src.take_transitions(), vec![KeyTransition::Down("ArrowRight".into())]);
    }

    #[test]
    fn tap_within_one_drain_cancels() {
        let mut src = KeySource::new(true);
        let t0 = Instant::now();
        src.feed(press(KeyCode::Up), t0);
        src.feed(release(KeyCode::Up), t0);
        src.expire(t0);

        let mut held = false;
        for t in src.take_transitions() {
            held = matches!(t, KeyTransition::Down(_));
        }
        assert!(!held);
        assert!(src.was_pressed(KeyCode::Up));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut src = KeySource::new(false);
        src.feed(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(src.ctrl_c_pressed());
        src.begin_frame();
        assert!(!src.ctrl_c_pressed());
    }
}
