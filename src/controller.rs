/*!
Joypad shift register behind $4016/$4017.

Behavior:
- The host keeps each pad's live button state as a bitmask
  (Right=bit 0, Left, Down, Up, Start, Select, B, A=bit 7).
- A CPU write to the pad's port reloads an 8-bit shift register from the
  live state.
- Each CPU read returns the register's top bit and shifts it left, so the
  buttons come out serially A first (bit 7 downward). After eight reads the
  register has drained to zero.

This is the entire externally observable controller protocol; input polling
itself belongs to the host.
*/

/// Buttons in live-state bitmask order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Down,
    Up,
    Start,
    Select,
    B,
    A,
}

impl Button {
    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Button::Right => 1 << 0,
            Button::Left => 1 << 1,
            Button::Down => 1 << 2,
            Button::Up => 1 << 3,
            Button::Start => 1 << 4,
            Button::Select => 1 << 5,
            Button::B => 1 << 6,
            Button::A => 1 << 7,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    // Live button state written by the host. Bit set = pressed.
    buttons: u8,
    // Serial shift register drained by CPU reads.
    shift: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live button state with a raw bitmask.
    pub fn set_state_mask(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    pub fn current_mask(&self) -> u8 {
        self.buttons
    }

    /// CPU write to the pad's port: latch the live state into the shift
    /// register.
    pub fn reload(&mut self) {
        self.shift = self.buttons;
    }

    /// CPU read from the pad's port: emit the top bit, shift left.
    pub fn read(&mut self) -> u8 {
        let bit = (self.shift >> 7) & 1;
        self.shift <<= 1;
        bit
    }
}
