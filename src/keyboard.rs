use crate::constants::KEY_COUNT;

/// Pressed (true) or released (false) status of each key 0..F.
pub type Keys = [bool; KEY_COUNT];

/// # Keyboard
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// Anything that can report a snapshot of which of the 16 keys are held can drive
/// the key instructions (SKP, SKNP and LD Vx, K).
pub trait Keyboard {
    fn keys(&self) -> Keys;

    fn is_pressed(&self, key: u8) -> bool {
        self.keys()[(key & 0xF) as usize]
    }
}

impl Keyboard for Keys {
    fn keys(&self) -> Keys {
        *self
    }
}

#[cfg(test)]
mod test_keyboard {
    use super::*;

    #[test]
    fn test_keys_snapshot() {
        let mut keys = [false; KEY_COUNT];
        keys[0xA] = true;
        assert!(keys.is_pressed(0xA));
        assert!(!keys.is_pressed(0xB));
    }

    #[test]
    fn test_is_pressed_uses_low_nibble() {
        let mut keys = [false; KEY_COUNT];
        keys[0x3] = true;
        assert!(keys.is_pressed(0x13));
    }
}
