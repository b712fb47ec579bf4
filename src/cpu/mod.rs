/*!
cpu - the Hack ISA's register file, instruction decoder, and execute step.

Grounded on `original_source/simulator/cpu.go` for decode/execute semantics
and on the teacher's register-file split (`cpu::regs`/`cpu::state`) for the
module shape: a plain register struct, a decode layer producing a typed
instruction, and an execute function that is a pure state transition rather
than a method with side effects buried in it.

Submodules:
    alu - the 128-entry ALU control-word dispatch table.
*/

pub mod alu;

use crate::error::CpuError;

/// The four 16-bit registers named by spec.md §3: `A` (address/value), `D`
/// (data), `M` (mirror of `RAM[A]` for the duration of one execute step),
/// and `PC` (program counter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: i16,
    pub d: i16,
    pub pc: u16,
}

/// A decoded instruction word, either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `A ← value`; `value` is the low 15 bits of the word.
    Address(u16),
    Compute {
        comp: u8,
        dest: Dest,
        jump: Jump,
    },
}

/// Which registers a C-instruction's result is written to: any subset of
/// {A, D, M}, per the `dest` bitfield (bits 5..3, MSB-first: A, D, M).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dest {
    pub a: bool,
    pub d: bool,
    pub m: bool,
}

/// A jump condition, selected by the `jump` bitfield (bits 2..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Never,
    Jgt,
    Jeq,
    Jge,
    Jlt,
    Jne,
    Jle,
    Jmp,
}

impl Jump {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Jump::Never,
            0b001 => Jump::Jgt,
            0b010 => Jump::Jeq,
            0b011 => Jump::Jge,
            0b100 => Jump::Jlt,
            0b101 => Jump::Jne,
            0b110 => Jump::Jle,
            _ => Jump::Jmp,
        }
    }

    /// Whether `result` satisfies this jump condition.
    fn taken(self, result: i16) -> bool {
        match self {
            Jump::Never => false,
            Jump::Jgt => result > 0,
            Jump::Jeq => result == 0,
            Jump::Jge => result >= 0,
            Jump::Jlt => result < 0,
            Jump::Jne => result != 0,
            Jump::Jle => result <= 0,
            Jump::Jmp => true,
        }
    }
}

/// Decodes a 16-bit instruction word per spec.md §4.5: bit 15 discriminates
/// A- from C-instructions.
pub fn decode(word: u16) -> Instruction {
    if word & 0x8000 == 0 {
        return Instruction::Address(word & 0x7FFF);
    }
    let comp = ((word >> 6) & 0x7F) as u8;
    let dest = Dest {
        a: word & 0b0010_0000 != 0,
        d: word & 0b0001_0000 != 0,
        m: word & 0b0000_1000 != 0,
    };
    let jump = Jump::from_bits((word & 0b111) as u8);
    Instruction::Compute { comp, dest, jump }
}

/// The outcome of one [`execute`] call: whether `RAM[A]` should be
/// overwritten with the (possibly just-updated) `M` mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepEffect {
    pub write_memory: bool,
}

/// Executes one decoded instruction against `regs`, given the current
/// memory mirror `m` (the simulator loop is responsible for sourcing this
/// from `RAM[A]` before the call and committing it back after, per
/// spec.md §4.6's compute-tick sequence). Returns the write-back signal.
pub fn execute(
    regs: &mut Registers,
    m: &mut i16,
    instruction: Instruction,
) -> Result<StepEffect, CpuError> {
    match instruction {
        Instruction::Address(value) => {
            regs.a = value as i16;
            regs.pc = regs.pc.wrapping_add(1);
            Ok(StepEffect::default())
        }
        Instruction::Compute { comp, dest, jump } => {
            let op = alu::lookup(comp).ok_or(CpuError::BadOpcode(comp, regs.pc))?;
            let result = op(regs.d, regs.a, *m);
            if dest.a {
                regs.a = result;
            }
            if dest.d {
                regs.d = result;
            }
            if dest.m {
                *m = result;
            }
            let jump_taken = jump.taken(result);
            regs.pc = if jump_taken {
                (regs.a as u16) & 0x7FFF
            } else {
                regs.pc.wrapping_add(1)
            };
            Ok(StepEffect {
                write_memory: dest.m,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_address_instruction() {
        let instr = decode(0b0_111111111111111);
        assert_eq!(instr, Instruction::Address(0x7FFF));
    }

    #[test]
    fn a_instruction_leaves_d_and_m_unchanged_and_advances_pc() {
        let mut regs = Registers {
            a: 0,
            d: 7,
            pc: 3,
        };
        let mut m = 9;
        let instr = decode(0x1234);
        let effect = execute(&mut regs, &mut m, instr).unwrap();
        assert_eq!(regs.a, 0x1234);
        assert_eq!(regs.d, 7);
        assert_eq!(m, 9);
        assert_eq!(regs.pc, 4);
        assert!(!effect.write_memory);
    }

    #[test]
    fn alu_operation_x_plus_y_scenario() {
        let mut regs = Registers {
            a: 1235,
            d: 0,
            pc: 0,
        };
        let mut m = 0;
        let instr = decode(0b1110000010010000);
        execute(&mut regs, &mut m, instr).unwrap();
        assert_eq!(regs.d, 1235);
        assert_eq!(regs.a, 1235);
        assert_eq!(regs.pc, 1);
    }

    #[test]
    fn unconditional_jump_scenario() {
        let mut regs = Registers {
            a: 15,
            d: 23,
            pc: 7,
        };
        let mut m = 0;
        let instr = decode(0b1110001100000111);
        execute(&mut regs, &mut m, instr).unwrap();
        assert_eq!(regs.pc, 15);
    }

    #[test]
    fn jlt_checks_sign_bit_of_result() {
        let mut regs = Registers {
            a: 9,
            d: -1,
            pc: 5,
        };
        let mut m = 0;
        // comp=D (0b0_001100), jump=JLT (100)
        let instr = decode(0b1110_0011_00_000_100);
        execute(&mut regs, &mut m, instr).unwrap();
        assert_eq!(regs.pc, 9);
    }

    #[test]
    fn unknown_comp_code_is_an_error() {
        let mut regs = Registers::default();
        let mut m = 0;
        // comp=0b0100000 is unassigned.
        let instr = decode(0b1110_1000_00_000_000);
        let err = execute(&mut regs, &mut m, instr).unwrap_err();
        assert!(matches!(err, CpuError::BadOpcode(_, _)));
    }
}
