pub use chip8::Chip8;
pub use constants::CLOCK_SPEED;
pub use cpu::{cycle, cycle_with_logger, decode, decode2, disassemble, fetch, fetch_at, Line};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use keyboard::{Keyboard, Keys};
pub use logger::{LogTracer, Logger, TraceLog};
pub use operations::{pixel_index, to_bcd};
pub use state::{from_json, load_charset, load_rom, reset, to_json, Display, State};

mod chip8;
pub mod constants;
pub mod cpu;
mod error;
mod instruction;
mod keyboard;
mod logger;
mod opcode;
mod operations;
mod state;
