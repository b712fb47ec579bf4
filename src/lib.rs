#![doc = r#"
hacknand - toolchain and simulator for the Hack 16-bit educational
computer (the Nand-to-Tetris platform).

Modules:
- breadboard: discrete-event gate-level simulation substrate (pins, wires,
  callbacks, NAND/DFF primitives).
- hdl: lexer, parser, elaborator, and JSON test-vector runner for the HDL
  chip description language.
- cpu: the Hack ISA's register file, instruction decoder, and execute step.
- asm: the two-pass Hack assembler.
- vmtranslate: the VM-to-assembly translator for the stack-based VM command
  set.
- sim: the machine-level simulator (ROM/RAM, compute/device tick loop,
  Screen/Keyboard devices).
- error: subsystem error enums and the crate-level `Error` aggregate.
"#]

pub mod asm;
pub mod breadboard;
pub mod cpu;
pub mod error;
pub mod hdl;
pub mod sim;
pub mod vmtranslate;

pub use error::Error;
