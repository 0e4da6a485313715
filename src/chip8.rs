use crate::constants::{CPU_CYCLES_PER_TIMER_CYCLE, KEY_COUNT};
use crate::cpu::{cycle_with_logger, fetch};
use crate::error::Result;
use crate::keyboard::Keys;
use crate::logger::LogTracer;
use crate::state::{from_json, load_rom, to_json, Display, State};

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the loaded `rom` so the machine can be reset without reloading it
///  - `pressed_keys` with public interfaces for manipulating them
///
/// Supplies interfaces for:
/// - loading roms and resetting
/// - pressing and releasing keys
/// - advancing the CPU
/// - advancing its timers
/// - inspecting its display for rendering by some display
/// - saving and restoring its state
pub struct Chip8 {
    state: State,
    rom: Vec<u8>,
    pressed_keys: Keys,
    delay_counter: u8,
    draw_flag: bool,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            rom: Vec::new(),
            pressed_keys: [false; KEY_COUNT],
            delay_counter: 0,
            draw_flag: true,
        }
    }

    /// Load a rom and start it from a fresh state
    ///
    /// # Arguments
    /// * `rom` the raw program bytes
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.state = load_rom(State::new(), rom)?;
        self.rom = rom.to_vec();
        self.pressed_keys = [false; KEY_COUNT];
        self.delay_counter = 0;
        self.draw_flag = true;
        Ok(())
    }

    /// Start the current rom over from a fresh state
    pub fn reset(&mut self) -> Result<()> {
        let rom = std::mem::take(&mut self.rom);
        self.load_rom(&rom)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the display if it changed since it was last taken
    pub fn get_frame(&mut self) -> Option<&Display> {
        if self.draw_flag {
            self.draw_flag = false;
            Some(&self.state.display)
        } else {
            None
        }
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.pressed_keys[(key & 0xF) as usize] = true;
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.pressed_keys[(key & 0xF) as usize] = false;
    }

    /// Advances the CPU by a single cycle
    /// - gets and executes the next opcode
    /// - keeps the current state if it fails
    pub fn advance_cpu(&mut self) -> Result<()> {
        let next = match cycle_with_logger(&self.state, &self.pressed_keys, &mut LogTracer) {
            Ok(next) => next,
            Err(e) => {
                log::error!("{} at {:#06X}", e, self.state.pc);
                return Err(e);
            }
        };
        if next.display != self.state.display {
            self.draw_flag = true;
        }
        self.state = next;
        Ok(())
    }

    /// The opcode the next call to `advance_cpu` will execute
    pub fn next_op(&self) -> u16 {
        fetch(&self.state)
    }

    /// Handles delay counter and timers
    /// - decrements the delay counter
    /// - decrements timers when the counter hits 0, so once every `CPU_CYCLES_PER_TIMER_CYCLE` calls
    pub fn advance_timers(&mut self) {
        if self.delay_counter == 0 {
            self.delay_counter = CPU_CYCLES_PER_TIMER_CYCLE - 1;
            self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
            // Not sonified, only counted down
            self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
        } else {
            self.delay_counter -= 1;
        }
    }

    /// Serializes the current state
    pub fn save_state(&self) -> Result<String> {
        to_json(&self.state)
    }

    /// Replaces the current state with one produced by `save_state`
    /// - the current state is kept if `json` can't be restored
    pub fn restore_state(&mut self, json: &str) -> Result<()> {
        self.state = from_json(json)?;
        self.draw_flag = true;
        Ok(())
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
