//! Subsystem error enums and a crate-level aggregate for CLI-facing code.
//!
//! Each enum maps one-to-one onto the error kinds named by the spec: the
//! breadboard's invariant violations are kept out of here (they panic, since
//! they indicate an elaborator bug rather than a recoverable condition) while
//! everything a caller is expected to handle gets a variant.

use thiserror::Error;

/// Errors surfaced by [`crate::breadboard`] operations that are recoverable
/// (as opposed to the arena's invariant violations, which panic).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BreadboardError {
    #[error("invalid group id")]
    InvalidId,
    #[error("pin index out of range")]
    InvalidIndex,
    #[error("groups are not uniform in size")]
    NonUniform,
}

/// Errors produced while lexing or parsing HDL source.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum HdlError {
    #[error("unexpected token '{0}'")]
    ParseError(String),
    #[error("unterminated construct: {0}")]
    UnterminatedConstruct(String),
    #[error("chip '{0}' not found")]
    ChipNotFound(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
    #[error("identifier '{0}' redeclared")]
    DuplicateIdentifier(String),
    #[error(transparent)]
    Breadboard(#[from] BreadboardError),
    #[error("io error: {0}")]
    Io(String),
}

/// Errors from the CPU core's instruction decoder.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CpuError {
    #[error("unknown ALU control code {0:#09b} at pc={1}")]
    BadOpcode(u8, u16),
}

/// Errors from the two-pass assembler.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AsmError {
    #[error("unexpected token '{0}' on line {1}")]
    ParseError(String, usize),
    #[error("A-instruction address {0} exceeds the 15-bit address space")]
    AddressOverflow(u32),
    #[error("invalid destination field '{0}'")]
    InvalidDestination(String),
    #[error("invalid computation field '{0}'")]
    InvalidComputation(String),
    #[error("invalid jump field '{0}'")]
    InvalidJump(String),
}

/// Errors from the VM-to-assembly translator.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VmError {
    #[error("unexpected token '{0}' on line {1}")]
    ParseError(String, usize),
    #[error("unknown segment '{0}'")]
    UnknownSegment(String),
    #[error("segment index {0} out of range for segment '{1}'")]
    IndexOutOfRange(u16, String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// Errors from the simulator loop: ROM loading and runtime CPU faults.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SimError {
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed ROM line {0}: expected 16 characters of '0'/'1', got '{1}'")]
    MalformedRom(usize, String),
    #[error("program counter {0} is out of ROM bounds")]
    ProgramCounterOutOfBounds(u16),
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Asm(#[from] AsmError),
}

/// Crate-level error aggregating every subsystem, surfaced by the CLI
/// binaries.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Hdl(#[from] HdlError),
    #[error(transparent)]
    Breadboard(#[from] BreadboardError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Asm(#[from] AsmError),
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
