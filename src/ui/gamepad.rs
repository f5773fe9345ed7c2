/// Gamepad source using gilrs.
///
/// D-pad and left stick are reported as virtual keys ("DPadUp",
/// "StickLeft", ...) through the same `KeyTransition` stream the keyboard
/// uses, so a single binding table drives movement. Face and menu buttons
/// are edge-triggered actions mapped from config.toml `[gamepad]`.
///
/// Default mapping:
///   D-pad / Left Stick    →  Movement (virtual keys)
///   Start / A             →  Start
///   Start / Y             →  Reset
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use maze3d::config::GamepadConfig;
use maze3d::domain::entity::Direction;

use super::input::KeyTransition;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical face/menu buttons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

struct ActionMap {
    start: Vec<Btn>,
    reset: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse(names: &[String], fallback: &[Btn]) -> Vec<Btn> {
            let list: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if list.is_empty() {
                fallback.to_vec()
            } else {
                list
            }
        }
        ActionMap {
            start: parse(&cfg.start, &[Btn::Start, Btn::A]),
            reset: parse(&cfg.reset, &[Btn::Start, Btn::Y]),
            quit: parse(&cfg.quit, &[Btn::Select]),
        }
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

fn virtual_key(prefix: &str, dir: Direction) -> String {
    format!("{prefix}{dir:?}")
}

pub struct GamepadSource {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    held: [bool; BTN_COUNT],
    just_pressed: [bool; BTN_COUNT],

    // Indexed by dir_index
    dpad: [bool; 4],
    stick: [bool; 4],
    stick_x: f32,
    stick_y: f32,

    actions: ActionMap,
    transitions: Vec<KeyTransition>,

    connected: bool,
}

impl GamepadSource {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        log::info!("gamepad connected at startup: {connected}");

        GamepadSource {
            #[cfg(feature = "gamepad")]
            gilrs,
            held: [false; BTN_COUNT],
            just_pressed: [false; BTN_COUNT],
            dpad: [false; 4],
            stick: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            actions: ActionMap::from_config(cfg),
            transitions: Vec::new(),
            connected,
        }
    }

    /// Poll once per frame.
    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    pub fn take_transitions(&mut self) -> Vec<KeyTransition> {
        std::mem::take(&mut self.transitions)
    }

    /// A pad has been seen and not unplugged since.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn start_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.start)
    }

    pub fn reset_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.reset)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.quit)
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.on_gilrs_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.on_gilrs_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad {:?} connected", event.id);
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad {:?} disconnected", event.id);
                    self.disconnect();
                }
                _ => {}
            }
        }

        self.refresh_stick();
    }

    #[cfg(feature = "gamepad")]
    fn on_gilrs_button(&mut self, btn: Button, held: bool) {
        let dir = match btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.set_dpad(dir, held);
        } else if let Some(b) = Btn::from_gilrs(btn) {
            self.set_button(b, held);
        }
    }

    // ── State updates (hardware independent) ──

    fn set_button(&mut self, btn: Btn, held: bool) {
        let i = btn as usize;
        if held && !self.held[i] {
            self.just_pressed[i] = true;
        }
        self.held[i] = held;
    }

    fn set_dpad(&mut self, dir: Direction, held: bool) {
        let i = dir_index(dir);
        if self.dpad[i] != held {
            self.dpad[i] = held;
            self.push_transition("DPad", dir, held);
        }
    }

    /// Derive digital stick directions from the axes. Y is up-positive.
    fn refresh_stick(&mut self) {
        let want = [
            (Direction::Up, self.stick_y > STICK_DEADZONE),
            (Direction::Down, self.stick_y < -STICK_DEADZONE),
            (Direction::Left, self.stick_x < -STICK_DEADZONE),
            (Direction::Right, self.stick_x > STICK_DEADZONE),
        ];
        for (dir, held) in want {
            let i = dir_index(dir);
            if self.stick[i] != held {
                self.stick[i] = held;
                self.push_transition("Stick", dir, held);
            }
        }
    }

    fn push_transition(&mut self, prefix: &str, dir: Direction, held: bool) {
        let name = virtual_key(prefix, dir);
        self.transitions.push(if held {
            KeyTransition::Down(name)
        } else {
            KeyTransition::Up(name)
        });
    }

    /// Lift everything the unplugged pad was holding.
    fn disconnect(&mut self) {
        self.connected = false;
        self.release_all();
    }

    fn release_all(&mut self) {
        for dir in Direction::ALL {
            self.set_dpad(dir, false);
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
        self.refresh_stick();
        self.held = [false; BTN_COUNT];
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadSource {
        let cfg = GamepadConfig {
            start: vec!["Start".into(), "A".into()],
            reset: vec!["Y".into()],
            quit: vec!["Select".into()],
        };
        GamepadSource {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            held: [false; BTN_COUNT],
            just_pressed: [false; BTN_COUNT],
            dpad: [false; 4],
            stick: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            actions: ActionMap::from_config(&cfg),
            transitions: Vec::new(),
            connected: false,
        }
    }

    #[test]
    fn dpad_becomes_virtual_keys() {
        let mut p = pad();
        p.set_dpad(Direction::Up, true);
        p.set_dpad(Direction::Up, true);
        p.set_dpad(Direction::Up, false);
        assert_eq!(
            p.take_transitions(),
            vec![KeyTransition::Down("DPadUp".into()), KeyTransition::Up("DPadUp".into())]
        );
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut p = pad();
        p.stick_x = 0.1;
        p.refresh_stick();
        assert!(p.take_transitions().is_empty());

        p.stick_x = -0.8;
        p.stick_y = 0.9;
        p.refresh_stick();
        let t = p.take_transitions();
        assert!(t.contains(&KeyTransition::Down("StickLeft".into())));
        assert!(t.contains(&KeyTransition::Down("StickUp".into())));
    }

    #[test]
    fn actions_are_edge_triggered() {
        let mut p = pad();
        p.set_button(Btn::A, true);
        assert!(p.start_pressed());
        assert!(!p.reset_pressed());
        p.update();
        p.set_button(Btn::A, true); // still held
        assert!(!p.start_pressed());
    }

    #[test]
    fn unknown_names_fall_back_to_defaults() {
        let cfg = GamepadConfig { start: vec!["Turbo".into()], reset: vec![], quit: vec![] };
        let map = ActionMap::from_config(&cfg);
        assert_eq!(map.start, vec![Btn::Start, Btn::A]);
        assert_eq!(map.quit, vec![Btn::Select]);
    }

    #[test]
    fn disconnect_clears_connected_and_held_dpad() {
        let mut p = pad();
        p.connected = true;
        p.set_dpad(Direction::Up, true);
        p.take_transitions();
        assert!(p.connected());

        p.disconnect();
        assert!(!p.connected());
        assert_eq!(p.take_transitions(), vec![KeyTransition::Up("DPadUp".into())]);
    }

    #[test]
    fn release_all_lifts_everything() {
        let mut p = pad();
        p.set_dpad(Direction::Left, true);
        p.stick_x = 1.0;
        p.refresh_stick();
        p.take_transitions();
        p.release_all();
        let t = p.take_transitions();
        assert!(t.contains(&KeyTransition::Up("DPadLeft".into())));
        assert!(t.contains(&KeyTransition::Up("StickRight".into())));
    }
}
