/*!
asm - the two-pass Hack assembler: turns assembly text into the ROM word
format the simulator loader expects.

Grounded on `original_source/asm/parser.go` for the token/grammar shape (an
A-instruction is `@identifier-or-integer`, a C-instruction is
`dest=comp;jump` with both `dest=` and `;jump` optional, a label is
`(IDENTIFIER)`), and on the Hack platform's standard predefined-symbol
table (SP/LCL/ARG/THIS/THAT/R0-R15/SCREEN/KBD), supplemented here per
SPEC_FULL §3.1 since the spec's `hack` CLI (§6.1) accepts `.asm` sources
directly. `comp` mnemonics are the mirror image of [`crate::cpu::alu`]'s
128-entry table: each of the 28 live ALU codes has exactly one mnemonic.
*/

use crate::error::AsmError;
use std::collections::HashMap;

const FIRST_VARIABLE_ADDRESS: u16 = 16;

fn predefined_symbols() -> HashMap<String, u16> {
    let mut symbols = HashMap::new();
    symbols.insert("SP".to_string(), 0);
    symbols.insert("LCL".to_string(), 1);
    symbols.insert("ARG".to_string(), 2);
    symbols.insert("THIS".to_string(), 3);
    symbols.insert("THAT".to_string(), 4);
    symbols.insert("SCREEN".to_string(), 16384);
    symbols.insert("KBD".to_string(), 24576);
    for i in 0..16u16 {
        symbols.insert(format!("R{i}"), i);
    }
    symbols
}

/// One line of parsed assembly, stripped of labels (labels are resolved
/// into addresses during pass 1 and never emitted as instructions).
enum Line {
    Address(AddressTarget),
    Compute { dest: String, comp: String, jump: String },
}

enum AddressTarget {
    Literal(u16),
    Symbol(String),
}

/// Assembles Hack assembly `source` into ROM words. Two passes: the first
/// walks every non-label line to assign each label to the ROM address of
/// the instruction immediately following it; the second resolves every
/// `@symbol` (predefined, then label, then a newly allocated variable
/// starting at address 16) and encodes each instruction.
pub fn assemble(source: &str) -> Result<Vec<u16>, AsmError> {
    let lines = strip_comments_and_blank(source);
    let mut labels: HashMap<String, u16> = HashMap::new();
    let mut rom_address: u16 = 0;
    let mut parsed = Vec::with_capacity(lines.len());
    for (lineno, text) in &lines {
        if let Some(name) = text.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            labels.insert(name.to_string(), rom_address);
            continue;
        }
        parsed.push((*lineno, parse_line(text, *lineno)?));
        rom_address += 1;
    }

    let symbols = predefined_symbols();
    let mut variables: HashMap<String, u16> = HashMap::new();
    let mut next_variable = FIRST_VARIABLE_ADDRESS;
    let mut words = Vec::with_capacity(parsed.len());
    for (_, line) in &parsed {
        let word = match line {
            Line::Address(AddressTarget::Literal(value)) => {
                if *value > 0x7FFF {
                    return Err(AsmError::AddressOverflow(*value as u32));
                }
                *value
            }
            Line::Address(AddressTarget::Symbol(name)) => {
                let address = if let Some(&addr) = symbols.get(name.as_str()) {
                    addr
                } else if let Some(&addr) = labels.get(name) {
                    addr
                } else if let Some(&addr) = variables.get(name) {
                    addr
                } else {
                    let addr = next_variable;
                    next_variable += 1;
                    variables.insert(name.clone(), addr);
                    addr
                };
                address
            }
            Line::Compute { dest, comp, jump } => {
                let comp_bits = comp_bits(comp)
                    .ok_or_else(|| AsmError::InvalidComputation(comp.clone()))?;
                let dest_bits =
                    dest_bits(dest).ok_or_else(|| AsmError::InvalidDestination(dest.clone()))?;
                let jump_bits =
                    jump_bits(jump).ok_or_else(|| AsmError::InvalidJump(jump.clone()))?;
                0b111_0000000_000_000
                    | ((comp_bits as u16) << 6)
                    | ((dest_bits as u16) << 3)
                    | jump_bits as u16
            }
        };
        words.push(word);
    }
    Ok(words)
}

fn strip_comments_and_blank(source: &str) -> Vec<(usize, String)> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let without_comment = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let trimmed = without_comment.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some((i + 1, trimmed.to_string()))
            }
        })
        .collect()
}

fn parse_line(text: &str, lineno: usize) -> Result<Line, AsmError> {
    if let Some(rest) = text.strip_prefix('@') {
        if rest.is_empty() {
            return Err(AsmError::ParseError(text.to_string(), lineno));
        }
        return Ok(Line::Address(if let Ok(value) = rest.parse::<u16>() {
            AddressTarget::Literal(value)
        } else {
            AddressTarget::Symbol(rest.to_string())
        }));
    }
    let (rest, dest) = match text.split_once('=') {
        Some((d, rest)) => (rest, d.to_string()),
        None => (text, String::new()),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((c, j)) => (c.trim(), j.trim().to_string()),
        None => (rest.trim(), String::new()),
    };
    if comp.is_empty() {
        return Err(AsmError::ParseError(text.to_string(), lineno));
    }
    Ok(Line::Compute {
        dest,
        comp: comp.to_string(),
        jump,
    })
}

/// Encodes a `dest` mnemonic (any combination of the letters A, D, M, in
/// any order) into the 3-bit field, bit layout `a d m` matching
/// [`crate::cpu::Dest`].
fn dest_bits(mnemonic: &str) -> Option<u8> {
    let mut bits = 0u8;
    for c in mnemonic.chars() {
        bits |= match c {
            'A' => 0b100,
            'D' => 0b010,
            'M' => 0b001,
            _ => return None,
        };
    }
    Some(bits)
}

fn jump_bits(mnemonic: &str) -> Option<u8> {
    Some(match mnemonic {
        "" => 0b000,
        "JGT" => 0b001,
        "JEQ" => 0b010,
        "JGE" => 0b011,
        "JLT" => 0b100,
        "JNE" => 0b101,
        "JLE" => 0b110,
        "JMP" => 0b111,
        _ => return None,
    })
}

/// Encodes a `comp` mnemonic into the 7-bit `a c1..c6` field, the mirror
/// image of [`crate::cpu::alu`]'s 128-entry decode table.
fn comp_bits(mnemonic: &str) -> Option<u8> {
    Some(match mnemonic {
        "0" => 0b0_101010,
        "1" => 0b0_111111,
        "-1" => 0b0_111010,
        "D" => 0b0_001100,
        "A" => 0b0_110000,
        "M" => 0b1_110000,
        "!D" => 0b0_001101,
        "!A" => 0b0_110001,
        "!M" => 0b1_110001,
        "-D" => 0b0_001111,
        "-A" => 0b0_110011,
        "-M" => 0b1_110011,
        "D+1" => 0b0_011111,
        "A+1" => 0b0_110111,
        "M+1" => 0b1_110111,
        "D-1" => 0b0_001110,
        "A-1" => 0b0_110010,
        "M-1" => 0b1_110010,
        "D+A" => 0b0_000010,
        "D+M" => 0b1_000010,
        "D-A" => 0b0_010011,
        "D-M" => 0b1_010011,
        "A-D" => 0b0_000111,
        "M-D" => 0b1_000111,
        "D&A" => 0b0_000000,
        "D&M" => 0b1_000000,
        "D|A" => 0b0_010101,
        "D|M" => 0b1_010101,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_and_c_instructions() {
        let words = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();
        assert_eq!(words[0], 2);
        assert_eq!(words[1] & 0x8000, 0x8000);
        assert_eq!((words[1] >> 6) & 0x7F, 0b0_110000); // comp=A
        assert_eq!((words[1] >> 3) & 0b111, 0b010); // dest=D
    }

    #[test]
    fn predefined_symbols_resolve_to_fixed_addresses() {
        let words = assemble("@SCREEN\n@KBD\n@SP\n@R2\n").unwrap();
        assert_eq!(words, vec![16384, 24576, 0, 2]);
    }

    #[test]
    fn labels_bind_to_the_following_instruction_address() {
        let words = assemble("(LOOP)\n@LOOP\n0;JMP\n").unwrap();
        // @LOOP resolves to 0, the address of the instruction right after
        // the label (there's only one instruction here, at address 0).
        assert_eq!(words[0], 0);
    }

    #[test]
    fn variables_allocate_sequentially_from_16() {
        let words = assemble("@foo\n@bar\n@foo\n").unwrap();
        assert_eq!(words, vec![16, 17, 16]);
    }

    #[test]
    fn rejects_unknown_computation_mnemonic() {
        let err = assemble("D=Q\n").unwrap_err();
        assert!(matches!(err, AsmError::InvalidComputation(_)));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let words = assemble("// a comment\n\n@1\n// trailing\n").unwrap();
        assert_eq!(words, vec![1]);
    }
}
