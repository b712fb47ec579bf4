/*!
vmtranslate - lowers the stack-VM command set of spec.md §6 into Hack
assembly text, for the `vm` CLI binary to emit (the assembler in
[`crate::asm`] is a separate collaborator; this module never encodes
binary words itself).

Grounded on `original_source/vm/vm.go`, `vm/asm.go`, `vm/cmd.go` for the
segment-to-RAM mapping (SPEC_FULL §3.2) and the standard Hack VM
call/return frame convention (SPEC_FULL §4.6.2): FRAME is staged through
R13, RET through R14, matching the original's scratch-register usage
without porting its generic `AssemblyInstruction` builder DSL (which has
no idiomatic Rust counterpart - this module emits assembly lines
directly, in the teacher's style of small functions returning owned
`String`/`Vec<String>` rather than an AST of instruction objects).
*/

use crate::error::VmError;

/// Lowers one VM source file's `source` into Hack assembly lines.
/// `module_name` scopes `static` segment accesses to `{module_name}.{i}`
/// labels, per SPEC_FULL §3.2.
pub fn translate(module_name: &str, source: &str) -> Result<Vec<String>, VmError> {
    let mut translator = Translator::new(module_name);
    for (lineno, raw) in source.lines().enumerate() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        translator.command(line, lineno + 1)?;
    }
    Ok(translator.asm)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

struct Translator<'a> {
    module: &'a str,
    asm: Vec<String>,
    label_sequence: u32,
    call_sequence: u32,
    current_function: Option<String>,
}

impl<'a> Translator<'a> {
    fn new(module: &'a str) -> Self {
        Self {
            module,
            asm: Vec::new(),
            label_sequence: 0,
            call_sequence: 0,
            current_function: None,
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.asm.push(line.into());
    }

    fn emit_all(&mut self, lines: impl IntoIterator<Item = &'static str>) {
        for line in lines {
            self.emit(line);
        }
    }

    fn command(&mut self, line: &str, lineno: usize) -> Result<(), VmError> {
        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();
        match head {
            "push" => self.push(rest_segment(&rest, lineno)?),
            "pop" => self.pop(rest_segment(&rest, lineno)?),
            "add" => Ok(self.binary("M=D+M")),
            "sub" => Ok(self.binary("M=M-D")),
            "and" => Ok(self.binary("M=D&M")),
            "or" => Ok(self.binary("M=D|M")),
            "neg" => Ok(self.unary("M=-M")),
            "not" => Ok(self.unary("M=!M")),
            "eq" => Ok(self.comparison("JEQ")),
            "lt" => Ok(self.comparison("JLT")),
            "gt" => Ok(self.comparison("JGT")),
            "label" => self.label(single(&rest, lineno)?),
            "goto" => self.goto(single(&rest, lineno)?),
            "if-goto" => self.if_goto(single(&rest, lineno)?),
            "function" => self.function(&rest, lineno),
            "call" => self.call(&rest, lineno),
            "return" => Ok(self.ret()),
            other => Err(VmError::UnknownCommand(other.to_string())),
        }
    }

    fn push(&mut self, (segment, index): (&str, u16)) -> Result<(), VmError> {
        match segment {
            "constant" => {
                self.emit(format!("@{index}"));
                self.emit("D=A");
            }
            "local" => self.load_indirect("LCL", index, "D=M"),
            "argument" => self.load_indirect("ARG", index, "D=M"),
            "this" => self.load_indirect("THIS", index, "D=M"),
            "that" => self.load_indirect("THAT", index, "D=M"),
            "temp" => {
                let addr = temp_address(index)?;
                self.emit(format!("@{addr}"));
                self.emit("D=M");
            }
            "pointer" => {
                self.emit(format!("@{}", pointer_register(index)?));
                self.emit("D=M");
            }
            "static" => {
                self.emit(format!("@{}.{index}", self.module));
                self.emit("D=M");
            }
            other => return Err(VmError::UnknownSegment(other.to_string())),
        }
        self.push_d();
        Ok(())
    }

    fn pop(&mut self, (segment, index): (&str, u16)) -> Result<(), VmError> {
        match segment {
            "constant" => return Err(VmError::UnknownSegment("constant".to_string())),
            "local" => self.pop_indirect("LCL", index),
            "argument" => self.pop_indirect("ARG", index),
            "this" => self.pop_indirect("THIS", index),
            "that" => self.pop_indirect("THAT", index),
            "temp" => {
                let addr = temp_address(index)?;
                self.pop_d();
                self.emit(format!("@{addr}"));
                self.emit("M=D");
            }
            "pointer" => {
                let register = pointer_register(index)?;
                self.pop_d();
                self.emit(format!("@{register}"));
                self.emit("M=D");
            }
            "static" => {
                self.pop_d();
                self.emit(format!("@{}.{index}", self.module));
                self.emit("M=D");
            }
            other => return Err(VmError::UnknownSegment(other.to_string())),
        }
        Ok(())
    }

    /// `D = RAM[base+index]`, where `base` names a pointer register
    /// (LCL/ARG/THIS/THAT) holding the segment's start address.
    fn load_indirect(&mut self, base: &str, index: u16, into: &str) {
        self.emit(format!("@{base}"));
        self.emit("D=M");
        self.emit(format!("@{index}"));
        self.emit("A=D+A");
        self.emit(into);
    }

    /// `RAM[RAM[base]+index] = top-of-stack`, staging the target address
    /// through R13 before popping, since popping clobbers D.
    fn pop_indirect(&mut self, base: &str, index: u16) {
        self.emit(format!("@{base}"));
        self.emit("D=M");
        self.emit(format!("@{index}"));
        self.emit("D=D+A");
        self.emit("@R13");
        self.emit("M=D");
        self.pop_d();
        self.emit("@R13");
        self.emit("A=M");
        self.emit("M=D");
    }

    fn push_d(&mut self) {
        self.emit_all(["@SP", "A=M", "M=D", "@SP", "M=M+1"]);
    }

    fn pop_d(&mut self) {
        self.emit_all(["@SP", "AM=M-1", "D=M"]);
    }

    /// Binary arithmetic/logic: pops y into D, leaves x at the new stack
    /// top address, applies `op` (which reads D and the now-A-addressed
    /// x, writing the result back to M).
    fn binary(&mut self, op: &str) {
        self.emit_all(["@SP", "AM=M-1", "D=M", "A=A-1"]);
        self.emit(op);
    }

    fn unary(&mut self, op: &str) {
        self.emit_all(["@SP", "A=M-1"]);
        self.emit(op);
    }

    fn comparison(&mut self, jump: &str) {
        let n = self.label_sequence;
        self.label_sequence += 1;
        self.emit_all(["@SP", "AM=M-1", "D=M", "A=A-1", "D=M-D"]);
        self.emit(format!("@TRUE.{n}"));
        self.emit(format!("D;{jump}"));
        self.emit_all(["@SP", "A=M-1", "M=0"]);
        self.emit(format!("@END.{n}"));
        self.emit("0;JMP");
        self.emit(format!("(TRUE.{n})"));
        self.emit_all(["@SP", "A=M-1", "M=-1"]);
        self.emit(format!("(END.{n})"));
    }

    fn scoped(&self, label: &str) -> String {
        match &self.current_function {
            Some(function) => format!("{function}${label}"),
            None => label.to_string(),
        }
    }

    fn label(&mut self, name: &str) -> Result<(), VmError> {
        let scoped = self.scoped(name);
        self.emit(format!("({scoped})"));
        Ok(())
    }

    fn goto(&mut self, name: &str) -> Result<(), VmError> {
        let scoped = self.scoped(name);
        self.emit(format!("@{scoped}"));
        self.emit("0;JMP");
        Ok(())
    }

    fn if_goto(&mut self, name: &str) -> Result<(), VmError> {
        let scoped = self.scoped(name);
        self.pop_d();
        self.emit(format!("@{scoped}"));
        self.emit("D;JNE");
        Ok(())
    }

    fn function(&mut self, rest: &[&str], lineno: usize) -> Result<(), VmError> {
        let (name, n_locals) = name_and_count(rest, lineno)?;
        self.current_function = Some(name.to_string());
        self.emit(format!("({name})"));
        for _ in 0..n_locals {
            self.emit(format!("@{}", 0));
            self.emit("D=A");
            self.push_d();
        }
        Ok(())
    }

    fn call(&mut self, rest: &[&str], lineno: usize) -> Result<(), VmError> {
        let (name, n_args) = name_and_count(rest, lineno)?;
        let n = self.call_sequence;
        self.call_sequence += 1;
        let return_label = format!("{}$ret.{n}", name);
        self.emit(format!("@{return_label}"));
        self.emit("D=A");
        self.push_d();
        for segment in ["LCL", "ARG", "THIS", "THAT"] {
            self.emit(format!("@{segment}"));
            self.emit("D=M");
            self.push_d();
        }
        self.emit("@SP");
        self.emit("D=M");
        self.emit(format!("@{}", n_args + 5));
        self.emit("D=D-A");
        self.emit("@ARG");
        self.emit("M=D");
        self.emit("@SP");
        self.emit("D=M");
        self.emit("@LCL");
        self.emit("M=D");
        self.emit(format!("@{name}"));
        self.emit("0;JMP");
        self.emit(format!("({return_label})"));
        Ok(())
    }

    /// Restores the caller's frame from the saved pointers staged through
    /// R13 (`FRAME`) and R14 (`RET`), per SPEC_FULL §4.6.2.
    fn ret(&mut self) {
        self.emit_all(["@LCL", "D=M", "@R13", "M=D"]); // FRAME = LCL
        self.emit_all(["@5", "A=D-A", "D=M", "@R14", "M=D"]); // RET = *(FRAME-5)
        self.pop_d();
        self.emit_all(["@ARG", "A=M", "M=D"]); // *ARG = pop()
        self.emit_all(["@ARG", "D=M+1", "@SP", "M=D"]); // SP = ARG+1
        for target in ["THAT", "THIS", "ARG", "LCL"] {
            self.emit_all(["@R13", "AM=M-1", "D=M"]);
            self.emit(format!("@{target}"));
            self.emit("M=D");
        }
        self.emit_all(["@R14", "A=M", "0;JMP"]);
    }
}

fn single<'a>(rest: &[&'a str], lineno: usize) -> Result<&'a str, VmError> {
    rest.first()
        .copied()
        .ok_or_else(|| VmError::ParseError("missing argument".to_string(), lineno))
}

fn rest_segment<'a>(rest: &[&'a str], lineno: usize) -> Result<(&'a str, u16), VmError> {
    let segment = rest
        .first()
        .copied()
        .ok_or_else(|| VmError::ParseError("missing segment".to_string(), lineno))?;
    let index = rest
        .get(1)
        .ok_or_else(|| VmError::ParseError("missing index".to_string(), lineno))?
        .parse::<u16>()
        .map_err(|_| VmError::ParseError(rest.get(1).unwrap().to_string(), lineno))?;
    Ok((segment, index))
}

fn name_and_count<'a>(rest: &[&'a str], lineno: usize) -> Result<(&'a str, u16), VmError> {
    let name = rest
        .first()
        .copied()
        .ok_or_else(|| VmError::ParseError("missing name".to_string(), lineno))?;
    let count = rest
        .get(1)
        .ok_or_else(|| VmError::ParseError("missing count".to_string(), lineno))?
        .parse::<u16>()
        .map_err(|_| VmError::ParseError(rest.get(1).unwrap().to_string(), lineno))?;
    Ok((name, count))
}

fn temp_address(index: u16) -> Result<u16, VmError> {
    if index > 7 {
        return Err(VmError::IndexOutOfRange(index, "temp".to_string()));
    }
    Ok(5 + index)
}

fn pointer_register(index: u16) -> Result<&'static str, VmError> {
    match index {
        0 => Ok("THIS"),
        1 => Ok("THAT"),
        _ => Err(VmError::IndexOutOfRange(index, "pointer".to_string())),
    }
}
