/// Gamepad input tracker using gilrs.
///
/// Button mapping for menu actions is loaded from config.toml via
/// `load_button_config()`. Default mapping:
///   D-pad / Left Stick    →  Heading
///   Start / A             →  Confirm
///   Select                →  Cancel (back to title)
///   Start                 →  Restart after a loss

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers for mappable actions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    Start,
    Select,
}

const BTN_COUNT: usize = 6;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
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
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Menu actions a pad button can be bound to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Confirm,
    Cancel,
    Restart,
}

/// Bindings per action, indexed by `Action as usize`.
struct Bindings([Vec<Btn>; 3]);

impl Bindings {
    fn defaults() -> Self {
        Bindings([vec![Btn::Start, Btn::A], vec![Btn::Select], vec![Btn::Start]])
    }

    /// Replace an action's buttons. Unknown names are dropped; a list with
    /// no known names leaves the current binding alone.
    fn bind(&mut self, action: Action, names: &[String]) {
        let btns: Vec<Btn> = names.iter().filter_map(|n| Btn::from_name(n)).collect();
        if !btns.is_empty() {
            self.0[action as usize] = btns;
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Edge flags for this frame, indexed by `Btn as usize`.
    just_pressed: [bool; BTN_COUNT],

    /// Latest heading pressed on the D-pad, or pushed on the stick.
    heading: Option<Direction>,
    /// Stick direction currently past the deadzone.
    stick_dir: Option<Direction>,
    stick_x: f32,
    stick_y: f32,

    bindings: Bindings,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                if g.gamepads().next().is_some() {
                    tracing::info!("gamepad detected");
                }
                Some(g)
            }
            Err(e) => {
                tracing::warn!(error = %e, "gamepad support unavailable");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            heading: None,
            stick_dir: None,
            stick_x: 0.0,
            stick_y: 0.0,
            bindings: Bindings::defaults(),
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.bindings.bind(Action::Confirm, &cfg.confirm);
        self.bindings.bind(Action::Cancel, &cfg.cancel);
        self.bindings.bind(Action::Restart, &cfg.restart);
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.heading = None;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
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
                EventType::ButtonPressed(btn, _) => self.press(btn),
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.stick_x = value,
                    Axis::LeftStickY => self.stick_y = value,
                    _ => {}
                },
                EventType::Connected => tracing::info!("gamepad connected"),
                EventType::Disconnected => {
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                    self.stick_dir = None;
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }

        // A stick push counts once, when it crosses the deadzone.
        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir.is_some() && dir != self.stick_dir {
            self.heading = dir;
        }
        self.stick_dir = dir;
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        let dir = match gilrs_btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if dir.is_some() {
            self.heading = dir;
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.just_pressed[btn as usize] = true;
        }
    }

    /// Whether any button bound to `action` went down this frame.
    pub fn pressed(&self, action: Action) -> bool {
        self.bindings.0[action as usize].iter().any(|&b| self.just_pressed[b as usize])
    }

    /// Heading requested this frame.
    pub fn heading_request(&self) -> Option<Direction> {
        self.heading
    }
}

/// Dominant stick axis past the deadzone. Stick Y grows upward.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x > 0.0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if y > 0.0 { Direction::Up } else { Direction::Down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_picks_dominant_axis() {
        assert_eq!(stick_direction(0.1, 0.1), None);
        assert_eq!(stick_direction(0.9, 0.3), Some(Direction::Right));
        assert_eq!(stick_direction(-0.4, 0.2), Some(Direction::Left));
        assert_eq!(stick_direction(0.2, 0.8), Some(Direction::Up));
        assert_eq!(stick_direction(0.0, -0.5), Some(Direction::Down));
    }

    #[test]
    fn config_rebinds_only_known_buttons() {
        let mut b = Bindings::defaults();
        b.bind(Action::Cancel, &["East".to_string(), "Turbo".to_string()]);
        b.bind(Action::Restart, &["Turbo".to_string()]);
        assert_eq!(b.0[Action::Cancel as usize], vec![Btn::B]);
        assert_eq!(b.0[Action::Restart as usize], vec![Btn::Start]);
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("L1"), None);
    }
}
