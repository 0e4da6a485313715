use crate::constants::ADDRESS_MASK;
use crate::error::{Error, Result};
use crate::keyboard::Keys;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// # Instructions
/// Every opcode the CPU understands. Execution and disassembly both go through
/// `from_op`, so there is exactly one table of recognised opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Cls,
    Ret,
    Jp,
    Call,
    SeByte,
    SneByte,
    SeReg,
    LdByte,
    AddByte,
    LdReg,
    Or,
    And,
    Xor,
    AddReg,
    Sub,
    Shr,
    Subn,
    Shl,
    SneReg,
    LdI,
    JpV0,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddIVx,
    LdFVx,
    LdBVx,
    LdMemVx,
    LdVxMem,
}

impl Instruction {
    /// Selects the correct Instruction for a given Opcode
    pub fn from_op(op: u16) -> Result<Self> {
        use Instruction::*;

        let instruction = match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Cls,
            (0x0, 0x0, 0xE, 0xE) => Ret,
            (0x1, ..) => Jp,
            (0x2, ..) => Call,
            (0x3, ..) => SeByte,
            (0x4, ..) => SneByte,
            (0x5, .., 0x0) => SeReg,
            (0x6, ..) => LdByte,
            (0x7, ..) => AddByte,
            (0x8, .., 0x0) => LdReg,
            (0x8, .., 0x1) => Or,
            (0x8, .., 0x2) => And,
            (0x8, .., 0x3) => Xor,
            (0x8, .., 0x4) => AddReg,
            (0x8, .., 0x5) => Sub,
            (0x8, .., 0x6) => Shr,
            (0x8, .., 0x7) => Subn,
            (0x8, .., 0xE) => Shl,
            (0x9, .., 0x0) => SneReg,
            (0xA, ..) => LdI,
            (0xB, ..) => JpV0,
            (0xC, ..) => Rnd,
            (0xD, ..) => Drw,
            (0xE, _, 0x9, 0xE) => Skp,
            (0xE, _, 0xA, 0x1) => Sknp,
            (0xF, _, 0x0, 0x7) => LdVxDt,
            (0xF, _, 0x0, 0xA) => LdVxK,
            (0xF, _, 0x1, 0x5) => LdDtVx,
            (0xF, _, 0x1, 0x8) => LdStVx,
            (0xF, _, 0x1, 0xE) => AddIVx,
            (0xF, _, 0x2, 0x9) => LdFVx,
            (0xF, _, 0x3, 0x3) => LdBVx,
            (0xF, _, 0x5, 0x5) => LdMemVx,
            (0xF, _, 0x6, 0x5) => LdVxMem,
            _ => return Err(Error::IllegalOpcode { opcode: op }),
        };
        Ok(instruction)
    }

    /// The assembly mnemonic, with operands named rather than filled in.
    pub fn mnemonic(self) -> &'static str {
        use Instruction::*;

        match self {
            Cls => "CLS",
            Ret => "RET",
            Jp => "JP addr",
            Call => "CALL addr",
            SeByte => "SE Vx, byte",
            SneByte => "SNE Vx, byte",
            SeReg => "SE Vx, Vy",
            LdByte => "LD Vx, byte",
            AddByte => "ADD Vx, byte",
            LdReg => "LD Vx, Vy",
            Or => "OR Vx, Vy",
            And => "AND Vx, Vy",
            Xor => "XOR Vx, Vy",
            AddReg => "ADD Vx, Vy",
            Sub => "SUB Vx, Vy",
            Shr => "SHR Vx",
            Subn => "SUBN Vx, Vy",
            Shl => "SHL Vx",
            SneReg => "SNE Vx, Vy",
            LdI => "LD I, addr",
            JpV0 => "JP V0, addr",
            Rnd => "RND Vx, byte",
            Drw => "DRW Vx, Vy, nibble",
            Skp => "SKP Vx",
            Sknp => "SKNP Vx",
            LdVxDt => "LD Vx, DT",
            LdVxK => "LD Vx, K",
            LdDtVx => "LD DT, Vx",
            LdStVx => "LD ST, Vx",
            AddIVx => "ADD I, Vx",
            LdFVx => "LD F, Vx",
            LdBVx => "LD B, Vx",
            LdMemVx => "LD [I], Vx",
            LdVxMem => "LD Vx, [I]",
        }
    }

    /// The operands of `op` as this instruction reads them, e.g. `x=1, kk=2A`.
    pub fn operands(self, op: u16) -> String {
        use Instruction::*;

        match self {
            Cls | Ret => String::new(),
            Jp | Call | LdI | JpV0 => format!("nnn={:03X}", op.addr()),
            SeByte | SneByte | LdByte | AddByte | Rnd => {
                format!("x={:X}, kk={:02X}", op.x(), op.kk())
            }
            SeReg | LdReg | Or | And | Xor | AddReg | Sub | Subn | SneReg => {
                format!("x={:X}, y={:X}", op.x(), op.y())
            }
            Drw => format!("x={:X}, y={:X}, n={:X}", op.x(), op.y(), op.n()),
            Shr | Shl | Skp | Sknp | LdVxDt | LdVxK | LdDtVx | LdStVx | AddIVx | LdFVx
            | LdBVx | LdMemVx | LdVxMem => format!("x={:X}", op.x()),
        }
    }

    fn operation(self) -> Operation {
        use Instruction::*;

        match self {
            Cls => cls,
            Ret => ret,
            Jp => jp,
            Call => call,
            SeByte => se_byte,
            SneByte => sne_byte,
            SeReg => se_reg,
            LdByte => ld_byte,
            AddByte => add_byte,
            LdReg => ld_reg,
            Or => or,
            And => and,
            Xor => xor,
            AddReg => add_reg,
            Sub => sub,
            Shr => shr,
            Subn => subn,
            Shl => shl,
            SneReg => sne_reg,
            LdI => ld_i,
            JpV0 => jp_v0,
            Rnd => rnd,
            Drw => drw,
            Skp => skp,
            Sknp => sknp,
            LdVxDt => ld_vx_dt,
            LdVxK => ld_vx_k,
            LdDtVx => ld_dt_vx,
            LdStVx => ld_st_vx,
            AddIVx => add_i_vx,
            LdFVx => ld_f_vx,
            LdBVx => ld_b_vx,
            LdMemVx => ld_mem_vx,
            LdVxMem => ld_vx_mem,
        }
    }

    /// Runs the instruction against a copy of `state` whose pc has been advanced past it.
    /// `state` itself is never modified, so it is still the last valid State if this fails.
    pub fn execute(self, op: u16, state: &State, keys: &Keys) -> Result<State> {
        let next = State {
            pc: state.pc.wrapping_add(0x2) & ADDRESS_MASK,
            ..state.clone()
        };
        (self.operation())(op, next, keys)
    }
}
