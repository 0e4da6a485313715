use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::constants::{
    ADDRESS_MASK, DISPLAY_SIZE, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET,
};
use crate::error::{Error, Result};

/// The display is a flat, row-major buffer of 64x32 cells that are either 0 (off) or 1 (on).
pub type Display = [u8; DISPLAY_SIZE];

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Timers
/// - 2 8-bit timers (delay & sound)
/// - they are decremented by whoever drives the CPU, never by the CPU itself
///
/// ## Memory
/// - a stack of return addresses with one entry per pending CALL
///     - hardware stacks held 12-16 entries; this one is unbounded
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet once loaded
///     - 0x200.. holds the program
/// - 64x32 display buffer
///
/// States are values: instructions take one and hand back the next, nothing is shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(with = "BigArray")]
    pub memory: [u8; MEMORY_SIZE],
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: Vec<u16>,
    #[serde(with = "BigArray")]
    pub display: Display,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl State {
    /// A freshly reset State with the sprite sheet loaded, ready for a ROM.
    pub fn new() -> Self {
        load_charset(reset())
    }

    /// Reads a byte, wrapping the address into the 4 KiB address space.
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// A State with every byte, register, pixel and timer zeroed and the pc at the start of the program.
pub fn reset() -> State {
    State {
        memory: [0; MEMORY_SIZE],
        v: [0; 16],
        i: 0,
        pc: PROGRAM_START,
        stack: Vec::new(),
        display: [0; DISPLAY_SIZE],
        delay_timer: 0,
        sound_timer: 0,
    }
}

/// Copies the sprite sheet into 0x000..0x050, leaving the rest of memory alone.
pub fn load_charset(state: State) -> State {
    let mut memory = state.memory;
    memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);
    State { memory, ..state }
}

/// Copies a ROM verbatim into memory starting at 0x200.
///
/// # Arguments
/// * `state` the State to load into, normally a freshly reset one
/// * `rom` the raw program bytes
pub fn load_rom(state: State, rom: &[u8]) -> Result<State> {
    if rom.len() > MAX_ROM_SIZE {
        return Err(Error::RomTooLarge {
            size: rom.len(),
            max: MAX_ROM_SIZE,
        });
    }
    let start = PROGRAM_START as usize;
    let mut memory = state.memory;
    memory[start..start + rom.len()].copy_from_slice(rom);
    log::debug!("loaded {} byte ROM at {:#06X}", rom.len(), PROGRAM_START);
    Ok(State { memory, ..state })
}

/// Dumps the whole State as JSON.
pub fn to_json(state: &State) -> Result<String> {
    Ok(serde_json::to_string(state)?)
}

/// Restores a State dumped by `to_json`.
///
/// The registers come back as a fixed `[u8; 16]`, anything that doesn't fit (wrong length,
/// values outside 0..=255) is rejected rather than coerced. A well-typed dump that no
/// program could have produced is rejected with `Error::InvalidState`.
pub fn from_json(json: &str) -> Result<State> {
    let state: State = serde_json::from_str(json)?;
    validate(&state)?;
    Ok(state)
}

fn validate(state: &State) -> Result<()> {
    if let Some(index) = state.display.iter().position(|pixel| *pixel > 1) {
        return Err(Error::InvalidState(format!(
            "display cell {} is {}, expected 0 or 1",
            index, state.display[index]
        )));
    }
    if state.pc > ADDRESS_MASK {
        return Err(Error::InvalidState(format!(
            "pc {:#06X} is outside the address space",
            state.pc
        )));
    }
    if let Some(addr) = state.stack.iter().find(|addr| **addr > ADDRESS_MASK) {
        return Err(Error::InvalidState(format!(
            "return address {:#06X} is outside the address space",
            addr
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test_state {
    use super::*;

    #[test]
    fn test_reset_zeroes_everything() {
        let state = reset();
        assert_eq!(state.memory.len(), 4096);
        assert!(state.memory.iter().all(|b| *b == 0));
        assert_eq!(state.v, [0; 16]);
        assert_eq!(state.i, 0);
        assert_eq!(state.pc, 0x200);
        assert!(state.stack.is_empty());
        assert_eq!(state.display.len(), 2048);
        assert!(state.display.iter().all(|p| *p == 0));
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.sound_timer, 0);
    }

    #[test]
    fn test_load_charset_from_0x000() {
        let state = load_charset(reset());
        assert_eq!(state.memory[0x000..0x050], SPRITE_SHEET[..]);
    }

    #[test]
    fn test_load_charset_leaves_rest_of_memory() {
        let mut state = reset();
        state.memory[0x050] = 0xAB;
        state.memory[0x300] = 0xCD;
        state.memory[0xFFF] = 0xEF;
        let before = state.memory;
        let state = load_charset(state);
        assert_eq!(state.memory[0x050..], before[0x050..]);
    }

    #[test]
    fn test_load_rom_at_0x200() {
        let state = load_rom(State::new(), &[0x00, 0xE0, 0x12, 0x00]).unwrap();
        assert_eq!(state.memory[0x200..0x204], [0x00, 0xE0, 0x12, 0x00]);
        assert_eq!(state.memory[0x204], 0x00);
        assert_eq!(state.memory[..0x050], SPRITE_SHEET[..]);
    }

    #[test]
    fn test_load_rom_fills_memory() {
        let rom = vec![0xAA; MAX_ROM_SIZE];
        let state = load_rom(State::new(), &rom).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAA);
    }

    #[test]
    fn test_load_rom_too_large() {
        let rom = vec![0; MAX_ROM_SIZE + 1];
        match load_rom(State::new(), &rom) {
            Err(Error::RomTooLarge { size, max }) => {
                assert_eq!(size, MAX_ROM_SIZE + 1);
                assert_eq!(max, MAX_ROM_SIZE);
            }
            other => panic!("expected RomTooLarge but got {:?}", other),
        }
    }

    #[test]
    fn test_read_wraps() {
        let mut state = reset();
        state.memory[0x001] = 0x42;
        assert_eq!(state.read(0x1001), 0x42);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut state = load_rom(State::new(), &[0x60, 0xFF]).unwrap();
        state.v[0x0] = 0xFF;
        state.v[0xF] = 0x1;
        state.i = 0x2AB;
        state.pc = 0x204;
        state.stack = vec![0x202, 0x30A];
        state.display[100] = 1;
        state.delay_timer = 0x3C;
        state.sound_timer = 0x02;
        let restored = from_json(&to_json(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
        let v: [u8; 16] = restored.v;
        assert_eq!(v[0x0], 0xFF);
    }

    #[test]
    fn test_from_json_rejects_wide_registers() {
        let json = to_json(&State::new()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["v"][0] = serde_json::json!(256);
        assert!(matches!(
            from_json(&value.to_string()),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_short_registers() {
        let json = to_json(&State::new()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["v"] = serde_json::json!([0, 1, 2]);
        assert!(from_json(&value.to_string()).is_err());
    }

    fn edited(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&State::new()).unwrap()).unwrap();
        edit(&mut value);
        value.to_string()
    }

    #[test]
    fn test_from_json_rejects_non_binary_pixels() {
        let json = edited(|value| value["display"][0] = serde_json::json!(2));
        assert!(matches!(from_json(&json), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_from_json_rejects_pc_outside_memory() {
        let json = edited(|value| value["pc"] = serde_json::json!(0xFFFF));
        assert!(matches!(from_json(&json), Err(Error::InvalidState(_))));
        let json = edited(|value| value["pc"] = serde_json::json!(0x1000));
        assert!(matches!(from_json(&json), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_from_json_accepts_last_address() {
        // 1FFF jumps here
        let json = edited(|value| value["pc"] = serde_json::json!(0xFFF));
        assert_eq!(from_json(&json).unwrap().pc, 0xFFF);
    }

    #[test]
    fn test_from_json_rejects_stack_outside_memory() {
        let json = edited(|value| value["stack"] = serde_json::json!([0x202, 0x2000]));
        assert!(matches!(from_json(&json), Err(Error::InvalidState(_))));
    }
}
