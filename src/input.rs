use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use winit::event::ElementState;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Keys a script can poll. Layout-independent, matching physical key positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
    Shift,
    Control,
}

impl KeyCode {
    /// Parses a binding name from config (`"w"`, `"up"`, `"left_shift"`, ...).
    pub fn from_name(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let mut chars = normalized.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Self::from_char(ch);
        }
        match normalized.as_str() {
            "up" | "arrow_up" => Some(Self::Up),
            "down" | "arrow_down" => Some(Self::Down),
            "left" | "arrow_left" => Some(Self::Left),
            "right" | "arrow_right" => Some(Self::Right),
            "space" => Some(Self::Space),
            "enter" | "return" => Some(Self::Enter),
            "escape" | "esc" => Some(Self::Escape),
            "tab" => Some(Self::Tab),
            "shift" | "left_shift" | "right_shift" => Some(Self::Shift),
            "ctrl" | "control" | "left_ctrl" | "right_ctrl" => Some(Self::Control),
            _ => None,
        }
    }

    fn from_char(ch: char) -> Option<Self> {
        use KeyCode::*;
        let key = match ch {
            'a' => A,
            'b' => B,
            'c' => C,
            'd' => D,
            'e' => E,
            'f' => F,
            'g' => G,
            'h' => H,
            'i' => I,
            'j' => J,
            'k' => K,
            'l' => L,
            'm' => M,
            'n' => N,
            'o' => O,
            'p' => P,
            'q' => Q,
            'r' => R,
            's' => S,
            't' => T,
            'u' => U,
            'v' => V,
            'w' => W,
            'x' => X,
            'y' => Y,
            'z' => Z,
            '0' => Digit0,
            '1' => Digit1,
            '2' => Digit2,
            '3' => Digit3,
            '4' => Digit4,
            '5' => Digit5,
            '6' => Digit6,
            '7' => Digit7,
            '8' => Digit8,
            '9' => Digit9,
            _ => return None,
        };
        Some(key)
    }

    pub fn from_physical_key(key: &PhysicalKey) -> Option<Self> {
        use KeyCode::*;
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        let key = match code {
            WinitKeyCode::KeyA => A,
            WinitKeyCode::KeyB => B,
            WinitKeyCode::KeyC => C,
            WinitKeyCode::KeyD => D,
            WinitKeyCode::KeyE => E,
            WinitKeyCode::KeyF => F,
            WinitKeyCode::KeyG => G,
            WinitKeyCode::KeyH => H,
            WinitKeyCode::KeyI => I,
            WinitKeyCode::KeyJ => J,
            WinitKeyCode::KeyK => K,
            WinitKeyCode::KeyL => L,
            WinitKeyCode::KeyM => M,
            WinitKeyCode::KeyN => N,
            WinitKeyCode::KeyO => O,
            WinitKeyCode::KeyP => P,
            WinitKeyCode::KeyQ => Q,
            WinitKeyCode::KeyR => R,
            WinitKeyCode::KeyS => S,
            WinitKeyCode::KeyT => T,
            WinitKeyCode::KeyU => U,
            WinitKeyCode::KeyV => V,
            WinitKeyCode::KeyW => W,
            WinitKeyCode::KeyX => X,
            WinitKeyCode::KeyY => Y,
            WinitKeyCode::KeyZ => Z,
            WinitKeyCode::Digit0 => Digit0,
            WinitKeyCode::Digit1 => Digit1,
            WinitKeyCode::Digit2 => Digit2,
            WinitKeyCode::Digit3 => Digit3,
            WinitKeyCode::Digit4 => Digit4,
            WinitKeyCode::Digit5 => Digit5,
            WinitKeyCode::Digit6 => Digit6,
            WinitKeyCode::Digit7 => Digit7,
            WinitKeyCode::Digit8 => Digit8,
            WinitKeyCode::Digit9 => Digit9,
            WinitKeyCode::ArrowUp => Up,
            WinitKeyCode::ArrowDown => Down,
            WinitKeyCode::ArrowLeft => Left,
            WinitKeyCode::ArrowRight => Right,
            WinitKeyCode::Space => Space,
            WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => Enter,
            WinitKeyCode::Escape => Escape,
            WinitKeyCode::Tab => Tab,
            WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => Shift,
            WinitKeyCode::ControlLeft | WinitKeyCode::ControlRight => Control,
            _ => return None,
        };
        Some(key)
    }
}

/// Key-down polling as seen by scripts.
pub trait InputPolling {
    fn is_key_down(&self, key: KeyCode) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: KeyCode, pressed: bool },
    Other,
}

impl InputEvent {
    /// Translates a winit keyboard event; keys scripts cannot poll become `Other`.
    pub fn from_physical(key: &PhysicalKey, state: ElementState) -> Self {
        match KeyCode::from_physical_key(key) {
            Some(key) => InputEvent::Key { key, pressed: state == ElementState::Pressed },
            None => InputEvent::Other,
        }
    }
}

/// Held-key state fed by the platform layer once per event.
#[derive(Debug, Default, Clone)]
pub struct Input {
    held: HashSet<KeyCode>,
    pub events: Vec<InputEvent>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ev: InputEvent) {
        if let InputEvent::Key { key, pressed } = ev {
            self.set_key(key, pressed);
        }
        self.events.push(ev);
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn clear_frame(&mut self) {
        self.events.clear();
    }

    /// Releases every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl InputPolling for Input {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ZoomIn,
    ZoomOut,
}

impl PlayerAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "move_up" => Some(Self::MoveUp),
            "move_down" => Some(Self::MoveDown),
            "move_left" => Some(Self::MoveLeft),
            "move_right" => Some(Self::MoveRight),
            "zoom_in" => Some(Self::ZoomIn),
            "zoom_out" => Some(Self::ZoomOut),
            _ => None,
        }
    }
}

/// Raw `input` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub bindings: HashMap<String, Vec<String>>,
}

impl InputConfig {
    fn into_overrides(self, origin: &str) -> HashMap<PlayerAction, Vec<KeyCode>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            match PlayerAction::from_str(&action_key) {
                Some(action) => {
                    let mut parsed = Vec::new();
                    for key in keys {
                        match KeyCode::from_name(&key) {
                            Some(code) => parsed.push(code),
                            None => log::warn!(
                                "[input] {origin}: unknown key '{key}' for action '{action_name}', ignoring."
                            ),
                        }
                    }
                    if parsed.is_empty() {
                        log::warn!(
                            "[input] {origin}: action '{action_name}' has no valid keys, keeping defaults."
                        );
                        continue;
                    }
                    overrides.insert(action, parsed);
                }
                None => log::warn!("[input] {origin}: unknown action '{action_name}', ignoring."),
            }
        }
        overrides
    }
}

/// Maps player actions to the keys that trigger them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBindings {
    action_to_keys: HashMap<PlayerAction, Vec<KeyCode>>,
}

impl PlayerBindings {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfig>(&contents) {
                Ok(config) => Self::from_config(config, &path.display().to_string()),
                Err(err) => {
                    log::warn!(
                        "[input] Failed to parse {}: {err}. Falling back to default bindings.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[input] Failed to read {}: {err}. Falling back to default bindings.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn from_config(config: InputConfig, origin: &str) -> Self {
        let overrides = config.into_overrides(origin);
        Self::with_overrides(overrides)
    }

    fn with_overrides(overrides: HashMap<PlayerAction, Vec<KeyCode>>) -> Self {
        let mut action_to_keys = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_to_keys.insert(action, keys);
        }
        Self { action_to_keys }
    }

    fn default_action_map() -> HashMap<PlayerAction, Vec<KeyCode>> {
        use PlayerAction::*;
        let mut map = HashMap::new();
        map.insert(MoveUp, vec![KeyCode::W]);
        map.insert(MoveDown, vec![KeyCode::S]);
        map.insert(MoveLeft, vec![KeyCode::A]);
        map.insert(MoveRight, vec![KeyCode::D]);
        map.insert(ZoomIn, vec![KeyCode::Q]);
        map.insert(ZoomOut, vec![KeyCode::E]);
        map
    }

    pub fn keys(&self, action: PlayerAction) -> &[KeyCode] {
        self.action_to_keys.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_held(&self, action: PlayerAction, input: &dyn InputPolling) -> bool {
        self.keys(action).iter().any(|key| input.is_key_down(*key))
    }
}

impl Default for PlayerBindings {
    fn default() -> Self {
        Self { action_to_keys: Self::default_action_map() }
    }
}
