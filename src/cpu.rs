use std::fmt;

use crate::error::Result;
use crate::instruction::Instruction;
use crate::keyboard::Keyboard;
use crate::logger::Logger;
use crate::state::State;

/// Gets the opcode currently pointed at by the pc.
/// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
pub fn fetch(state: &State) -> u16 {
    fetch_at(state, state.pc)
}

/// Gets the opcode at an arbitrary address, e.g. to preview instructions without running them.
pub fn fetch_at(state: &State, addr: u16) -> u16 {
    let left = u16::from(state.read(addr));
    let right = u16::from(state.read(addr.wrapping_add(1)));
    left << 8 | right
}

/// Decodes `op` and executes it against `state`, returning the next State.
///
/// An illegal opcode (or an instruction that fails) leaves `state` as the last valid State.
pub fn decode<K>(state: &State, op: u16, keyboard: &K, logger: &mut dyn Logger) -> Result<State>
where
    K: Keyboard + ?Sized,
{
    let instruction = Instruction::from_op(op)?;
    if logger.enabled() {
        logger.log(&trace(instruction, op));
    }
    instruction.execute(op, state, &keyboard.keys())
}

/// The mnemonic for `op` without executing it, or a description of why it isn't one.
pub fn decode2(op: u16) -> String {
    match Instruction::from_op(op) {
        Ok(instruction) => instruction.mnemonic().to_owned(),
        Err(e) => e.to_string(),
    }
}

/// Fetches, decodes and executes a single instruction.
pub fn cycle<K>(state: &State, keyboard: &K) -> Result<State>
where
    K: Keyboard + ?Sized,
{
    cycle_with_logger(state, keyboard, &mut ())
}

/// `cycle`, with a trace line per executed instruction handed to `logger`.
pub fn cycle_with_logger<K>(state: &State, keyboard: &K, logger: &mut dyn Logger) -> Result<State>
where
    K: Keyboard + ?Sized,
{
    decode(state, fetch(state), keyboard, logger)
}

fn trace(instruction: Instruction, op: u16) -> String {
    let operands = instruction.operands(op);
    if operands.is_empty() {
        format!("{:04X} - {}", op, instruction.mnemonic())
    } else {
        format!("{:04X} - {}: {}", op, instruction.mnemonic(), operands)
    }
}

/// A single disassembled word.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub addr: u16,
    pub opcode: u16,
    pub mnemonic: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}| {}", self.addr, self.mnemonic)
    }
}

/// Disassembles `count` words starting from `from`.
pub fn disassemble(state: &State, from: u16, count: usize) -> Vec<Line> {
    (0..count)
        .map(|n| {
            let addr = from.wrapping_add(2 * n as u16);
            let opcode = fetch_at(state, addr);
            Line {
                addr,
                opcode,
                mnemonic: decode2(opcode),
            }
        })
        .collect()
}

/// Number of words shown by a listing.
pub const LISTING_LENGTH: usize = 20;

/// Keeps a listing window steady while the pc walks through it.
///
/// Returns the new window start: `last` while `pc` stays within the window, `pc` once
/// it jumps backwards or runs off the end.
pub fn listing_start(last: u16, pc: u16) -> u16 {
    let window = 2 * (LISTING_LENGTH as u16 - 2);
    if pc < last || pc - last > window {
        pc
    } else {
        last
    }
}

/// The words around the pc, starting one instruction before the window.
pub fn listing(state: &State, window_start: u16) -> Vec<Line> {
    disassemble(state, window_start.saturating_sub(2), LISTING_LENGTH)
}
