use std::collections::HashMap;

/// Bitset of non-axis buttons held during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputButtons(u8);

impl InputButtons {
    /// No buttons held.
    pub const NONE: Self = Self(0);
    /// Melee attack button.
    pub const ATTACK: Self = Self(1);

    /// Reports whether every bit in `other` is held.
    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

/// Held-button and axis snapshot polled once per simulation tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Horizontal axis in `-1..=1`, positive towards increasing X.
    pub axis_h: i8,
    /// Vertical axis in `-1..=1`, positive towards increasing Z.
    pub axis_v: i8,
    /// Held buttons.
    pub buttons: InputButtons,
}

impl InputSnapshot {
    /// Snapshot with no input held.
    pub const IDLE: Self = Self {
        axis_h: 0,
        axis_v: 0,
        buttons: InputButtons::NONE,
    };

    /// Creates a snapshot from axis values, clamping each into `-1..=1`.
    #[must_use]
    pub fn new(axis_h: i8, axis_v: i8, buttons: InputButtons) -> Self {
        Self {
            axis_h: axis_h.clamp(-1, 1),
            axis_v: axis_v.clamp(-1, 1),
            buttons,
        }
    }
}

/// Logical actions that physical keys map onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    /// Move towards decreasing X.
    Left,
    /// Move towards decreasing Z.
    Up,
    /// Move towards increasing X.
    Right,
    /// Move towards increasing Z.
    Down,
    /// Swing the equipped weapon.
    Attack,
}

impl InputAction {
    const ALL: [Self; 5] = [Self::Left, Self::Up, Self::Right, Self::Down, Self::Attack];

    const fn slot(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Up => 1,
            Self::Right => 2,
            Self::Down => 3,
            Self::Attack => 4,
        }
    }
}

const DEFAULT_KEYS: [(u32, InputAction); 5] = [
    (37, InputAction::Left),
    (38, InputAction::Up),
    (39, InputAction::Right),
    (40, InputAction::Down),
    (32, InputAction::Attack),
];

/// Key-mapped input state fed by host key events.
#[derive(Clone, Debug)]
pub struct InputState {
    key_map: HashMap<u32, InputAction>,
    held: [bool; InputAction::ALL.len()],
}

impl InputState {
    /// Creates an input state bound to the arrow keys and space bar.
    #[must_use]
    pub fn new() -> Self {
        let mut state = Self {
            key_map: HashMap::new(),
            held: [false; InputAction::ALL.len()],
        };
        state.restore_default_keys();
        state
    }

    /// Replaces every binding with the default arrow-key layout.
    pub fn restore_default_keys(&mut self) {
        self.key_map.clear();
        self.key_map.extend(DEFAULT_KEYS);
    }

    /// Binds a key code to an action, returning the action it previously triggered.
    pub fn bind(&mut self, key_code: u32, action: InputAction) -> Option<InputAction> {
        self.key_map.insert(key_code, action)
    }

    /// Records a key press. Unmapped keys are ignored.
    pub fn key_down(&mut self, key_code: u32) {
        self.set_held(key_code, true);
    }

    /// Records a key release. Unmapped keys are ignored.
    pub fn key_up(&mut self, key_code: u32) {
        self.set_held(key_code, false);
    }

    /// Reports whether the action is currently held.
    #[must_use]
    pub fn is_held(&self, action: InputAction) -> bool {
        self.held[action.slot()]
    }

    /// Captures the snapshot consumed by the player state machine.
    #[must_use]
    pub fn snapshot(&self) -> InputSnapshot {
        let axis = |negative: InputAction, positive: InputAction| {
            i8::from(self.is_held(positive)) - i8::from(self.is_held(negative))
        };
        let buttons = if self.is_held(InputAction::Attack) {
            InputButtons::ATTACK
        } else {
            InputButtons::NONE
        };
        InputSnapshot {
            axis_h: axis(InputAction::Left, InputAction::Right),
            axis_v: axis(InputAction::Up, InputAction::Down),
            buttons,
        }
    }

    fn set_held(&mut self, key_code: u32, held: bool) {
        if let Some(action) = self.key_map.get(&key_code) {
            self.held[action.slot()] = held;
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel_on_axis() {
        let mut input = InputState::new();
        input.key_down(37);
        input.key_down(39);
        assert_eq!(input.snapshot().axis_h, 0);
        input.key_up(37);
        assert_eq!(input.snapshot().axis_h, 1);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut input = InputState::new();
        input.key_down(999);
        assert_eq!(input.snapshot(), InputSnapshot::IDLE);
    }

    #[test]
    fn rebinding_replaces_previous_action() {
        let mut input = InputState::new();
        assert_eq!(input.bind(87, InputAction::Up), None);
        assert_eq!(input.bind(87, InputAction::Down), Some(InputAction::Up));
        input.key_down(87);
        assert_eq!(input.snapshot().axis_v, 1);
    }

    #[test]
    fn attack_key_sets_button_bit() {
        let mut input = InputState::new();
        input.key_down(32);
        assert!(input.snapshot().buttons.contains(InputButtons::ATTACK));
    }
}
