use crate::constants::{ADDRESS_MASK, CHAR_OFFSETS, DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH};
use crate::error::{Error, Result};
use crate::keyboard::{Keyboard, Keys};
use crate::opcode::Opcode;
use crate::state::State;

/// Executes a single instruction.
///
/// The State handed in has already had its pc advanced past the instruction, so
/// operations that don't touch control flow leave it alone, skips add another 2 and
/// jumps overwrite it.
pub type Operation = fn(op: u16, state: State, keys: &Keys) -> Result<State>;

/// The decimal digits (hundreds, tens, ones) of a byte-sized value.
pub fn to_bcd(value: i32) -> Result<[u8; 3]> {
    if !(0..=255).contains(&value) {
        return Err(Error::BcdOutOfRange(value));
    }
    let value = value as u8;
    Ok([value / 100, value / 10 % 10, value % 10])
}

/// Index into the flat display buffer, wrapping both coordinates around the screen edges.
pub fn pixel_index(x: usize, y: usize) -> usize {
    (x % DISPLAY_WIDTH) + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH
}

fn skip_if(condition: bool, state: State) -> State {
    let pc = if condition {
        state.pc.wrapping_add(0x2) & ADDRESS_MASK
    } else {
        state.pc
    };
    State { pc, ..state }
}

/// clear
pub fn cls(_op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        display: [0; DISPLAY_SIZE],
        ..state
    })
}

/// PC = STACK.pop()
pub fn ret(_op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut stack = state.stack;
    match stack.pop() {
        Some(pc) => Ok(State { pc, stack, ..state }),
        None => Err(Error::StackUnderflow {
            pc: state.pc.wrapping_sub(0x2) & ADDRESS_MASK,
        }),
    }
}

/// PC = addr
pub fn jp(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        pc: op.addr(),
        ..state
    })
}

/// STACK.push(PC); PC = addr
pub fn call(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut stack = state.stack;
    stack.push(state.pc);
    Ok(State {
        pc: op.addr(),
        stack,
        ..state
    })
}

/// if Vx == kk then pc += 2
pub fn se_byte(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(skip_if(state.v[op.x()] == op.kk(), state))
}

/// if Vx != kk then pc += 2
pub fn sne_byte(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(skip_if(state.v[op.x()] != op.kk(), state))
}

/// if Vx == Vy then pc += 2
pub fn se_reg(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(skip_if(state.v[op.x()] == state.v[op.y()], state))
}

/// Vx = kk
pub fn ld_byte(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] = op.kk();
    Ok(State { v, ..state })
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add_byte(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] = v[op.x()].wrapping_add(op.kk());
    Ok(State { v, ..state })
}

/// Vx = Vy
pub fn ld_reg(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] = v[op.y()];
    Ok(State { v, ..state })
}

/// Vx |= Vy
pub fn or(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] |= v[op.y()];
    Ok(State { v, ..state })
}

/// Vx &= Vy
pub fn and(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] &= v[op.y()];
    Ok(State { v, ..state })
}

/// Vx ^= Vy
pub fn xor(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] ^= v[op.y()];
    Ok(State { v, ..state })
}

/// Vx += Vy; VF = carry
pub fn add_reg(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let (res, carry) = state.v[op.x()].overflowing_add(state.v[op.y()]);
    let mut v = state.v;
    v[op.x()] = res;
    v[0xF] = carry as u8;
    Ok(State { v, ..state })
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[op.x()] = vx.wrapping_sub(vy);
    v[0xF] = (vx > vy) as u8;
    Ok(State { v, ..state })
}

/// Vx >>= 1; VF = lsb
/// Only Vx is shifted, Vy is ignored
pub fn shr(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[op.x()] = vx >> 1;
    v[0xF] = vx & 0x1;
    Ok(State { v, ..state })
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[op.x()] = vy.wrapping_sub(vx);
    v[0xF] = (vy > vx) as u8;
    Ok(State { v, ..state })
}

/// Vx <<= 1; VF = msb
/// Only Vx is shifted, Vy is ignored
pub fn shl(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[op.x()] = vx << 1;
    v[0xF] = vx >> 7;
    Ok(State { v, ..state })
}

/// if Vx != Vy then pc += 2
pub fn sne_reg(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(skip_if(state.v[op.x()] != state.v[op.y()], state))
}

/// I = addr
pub fn ld_i(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        i: op.addr(),
        ..state
    })
}

/// PC = V0 + addr
pub fn jp_v0(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        pc: (u16::from(state.v[0x0]) + op.addr()) & ADDRESS_MASK,
        ..state
    })
}

/// Vx = rand_byte & kk
pub fn rnd(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let rand_byte: u8 = rand::random();
    let mut v = state.v;
    v[op.x()] = rand_byte & op.kk();
    Ok(State { v, ..state })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the display with wrapping.
/// Sets VF if any pixels were erased
pub fn drw(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let x = state.v[op.x()] as usize;
    let y = state.v[op.y()] as usize;
    let mut display = state.display;
    let mut collision = 0x0;

    for byte in 0..op.n() as usize {
        let sprite = state.read(state.i.wrapping_add(byte as u16));
        for bit in 0..8 {
            let pixel = (sprite >> (7 - bit)) & 0x1;
            let index = pixel_index(x + bit, y + byte);
            collision |= pixel & display[index];
            display[index] ^= pixel;
        }
    }

    let mut v = state.v;
    v[0xF] = collision;
    Ok(State { v, display, ..state })
}

/// if Vx.pressed then pc += 2
pub fn skp(op: u16, state: State, keys: &Keys) -> Result<State> {
    let pressed = keys.is_pressed(state.v[op.x()]);
    Ok(skip_if(pressed, state))
}

/// if !Vx.pressed then pc += 2
pub fn sknp(op: u16, state: State, keys: &Keys) -> Result<State> {
    let pressed = keys.is_pressed(state.v[op.x()]);
    Ok(skip_if(!pressed, state))
}

/// Vx = DT
pub fn ld_vx_dt(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    v[op.x()] = state.delay_timer;
    Ok(State { v, ..state })
}

/// Vx = first pressed key
/// Nothing pressed rewinds the pc so this instruction runs again on the next cycle
pub fn ld_vx_k(op: u16, state: State, keys: &Keys) -> Result<State> {
    match keys.iter().position(|pressed| *pressed) {
        Some(key) => {
            let mut v = state.v;
            v[op.x()] = key as u8;
            Ok(State { v, ..state })
        }
        None => Ok(State {
            pc: state.pc.wrapping_sub(0x2) & ADDRESS_MASK,
            ..state
        }),
    }
}

/// DT = Vx
pub fn ld_dt_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        delay_timer: state.v[op.x()],
        ..state
    })
}

/// ST = Vx
pub fn ld_st_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        sound_timer: state.v[op.x()],
        ..state
    })
}

/// I += Vx
/// VF is not touched on overflow
pub fn add_i_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        i: state.i.wrapping_add(u16::from(state.v[op.x()])),
        ..state
    })
}

/// I = sprite_addr(Vx)
/// See constants::SPRITE_SHEET for more details
pub fn ld_f_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    Ok(State {
        i: CHAR_OFFSETS[(state.v[op.x()] & 0xF) as usize],
        ..state
    })
}

/// mem[I..I+3] = bcd(Vx)
pub fn ld_b_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let digits = to_bcd(i32::from(state.v[op.x()]))?;
    let mut memory = state.memory;
    for (offset, digit) in digits.iter().enumerate() {
        memory[(state.i.wrapping_add(offset as u16) & ADDRESS_MASK) as usize] = *digit;
    }
    Ok(State { memory, ..state })
}

/// mem[I..=I+x] = V0..=Vx
pub fn ld_mem_vx(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut memory = state.memory;
    for register in 0..=op.x() {
        memory[(state.i.wrapping_add(register as u16) & ADDRESS_MASK) as usize] =
            state.v[register];
    }
    Ok(State { memory, ..state })
}

/// V0..=Vx = mem[I..=I+x]
pub fn ld_vx_mem(op: u16, state: State, _keys: &Keys) -> Result<State> {
    let mut v = state.v;
    for register in 0..=op.x() {
        v[register] = state.read(state.i.wrapping_add(register as u16));
    }
    Ok(State { v, ..state })
}

#[cfg(test)]
mod test_operations {
    use super::*;

    const NO_KEYS: Keys = [false; 16];

    #[test]
    fn test_to_bcd() {
        assert_eq!(to_bcd(111).unwrap(), [1, 1, 1]);
        assert_eq!(to_bcd(0).unwrap(), [0, 0, 0]);
        assert_eq!(to_bcd(255).unwrap(), [2, 5, 5]);
        assert_eq!(to_bcd(7).unwrap(), [0, 0, 7]);
    }

    #[test]
    fn test_to_bcd_out_of_range() {
        assert!(matches!(to_bcd(256), Err(Error::BcdOutOfRange(256))));
        assert!(matches!(to_bcd(-1), Err(Error::BcdOutOfRange(-1))));
    }

    #[test]
    fn test_pixel_index_wraps() {
        assert_eq!(pixel_index(0, 0), 0);
        assert_eq!(pixel_index(63, 0), 63);
        assert_eq!(pixel_index(0, 1), 64);
        assert_eq!(pixel_index(64, 0), 0);
        assert_eq!(pixel_index(65, 32), 1);
        assert_eq!(pixel_index(63, 31), 2047);
    }

    #[test]
    fn test_ret_on_empty_stack() {
        let state = State {
            pc: 0x202,
            ..State::new()
        };
        match ret(0x00EE, state, &NO_KEYS) {
            Err(Error::StackUnderflow { pc }) => assert_eq!(pc, 0x200),
            other => panic!("expected StackUnderflow but got {:?}", other),
        }
    }

    #[test]
    fn test_call_then_ret() {
        let state = State {
            pc: 0x202,
            ..State::new()
        };
        let state = call(0x2ABC, state, &NO_KEYS).unwrap();
        assert_eq!(state.pc, 0xABC);
        assert_eq!(state.stack, vec![0x202]);
        let state = ret(0x00EE, state, &NO_KEYS).unwrap();
        assert_eq!(state.pc, 0x202);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_add_reg_flag_wins_over_vf() {
        let mut state = State::new();
        state.v[0xF] = 0xFF;
        state.v[0x1] = 0x01;
        let state = add_reg(0x8F14, state, &NO_KEYS).unwrap();
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_sub_equal_operands_clears_vf() {
        let mut state = State::new();
        state.v[0x1] = 0x5;
        state.v[0x2] = 0x5;
        let state = sub(0x8125, state, &NO_KEYS).unwrap();
        assert_eq!(state.v[0x1], 0x0);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_jp_v0_wraps() {
        let mut state = State::new();
        state.v[0x0] = 0x10;
        let state = jp_v0(0xBFFF, state, &NO_KEYS).unwrap();
        assert_eq!(state.pc, 0x00F);
    }

    #[test]
    fn test_rnd_masks_with_kk() {
        for _ in 0..32 {
            let state = rnd(0xC10F, State::new(), &NO_KEYS).unwrap();
            assert_eq!(state.v[0x1] & 0xF0, 0x0);
        }
    }

    #[test]
    fn test_drw_wraps_around_edges() {
        let mut state = State::new();
        state.v[0x0] = 62;
        state.v[0x1] = 31;
        state.i = 0x300;
        state.memory[0x300] = 0b1111_0000;
        state.memory[0x301] = 0b1000_0000;
        let state = drw(0xD012, state, &NO_KEYS).unwrap();
        assert_eq!(state.display[pixel_index(62, 31)], 1);
        assert_eq!(state.display[pixel_index(63, 31)], 1);
        assert_eq!(state.display[pixel_index(0, 31)], 1);
        assert_eq!(state.display[pixel_index(1, 31)], 1);
        assert_eq!(state.display[pixel_index(62, 0)], 1);
        assert_eq!(state.display.iter().filter(|p| **p == 1).count(), 5);
    }

    #[test]
    fn test_ld_vx_k_waits() {
        let state = State {
            pc: 0x202,
            ..State::new()
        };
        let state = ld_vx_k(0xF30A, state, &NO_KEYS).unwrap();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.v[0x3], 0x0);
    }

    #[test]
    fn test_ld_vx_k_captures_lowest_key() {
        let mut keys = NO_KEYS;
        keys[0x9] = true;
        keys[0xC] = true;
        let state = State {
            pc: 0x202,
            ..State::new()
        };
        let state = ld_vx_k(0xF30A, state, &keys).unwrap();
        assert_eq!(state.pc, 0x202);
        assert_eq!(state.v[0x3], 0x9);
    }

    #[test]
    fn test_add_i_vx_leaves_vf() {
        let mut state = State::new();
        state.i = 0xFFFF;
        state.v[0x1] = 0x2;
        let state = add_i_vx(0xF11E, state, &NO_KEYS).unwrap();
        assert_eq!(state.i, 0x1);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_ld_mem_vx_wraps() {
        let mut state = State::new();
        state.i = 0xFFF;
        state.v[0x0] = 0xAA;
        state.v[0x1] = 0xBB;
        let state = ld_mem_vx(0xF155, state, &NO_KEYS).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAA);
        assert_eq!(state.memory[0x000], 0xBB);
        assert_eq!(state.i, 0xFFF);
    }
}
