//! Recursive chip instantiation: walks a [`ChipDef`] body, evaluating each
//! statement's expression into breadboard groups and binding the chip's
//! declared inputs/outputs onto them. Grounded on
//! `original_source/hdl/compiler.go` and `eval.go` for the evaluation rules
//! (`feedback`, `nand`, `dff`, general chip calls) of spec.md §4.4.

use super::ast::{ChipDef, Expression, Statement};
use crate::breadboard::{primitives, Breadboard, GroupId, Wire};
use crate::error::HdlError;
use std::collections::HashMap;

/// A chip library: every chip definition reachable from the entry file,
/// keyed by name. Built by the caller after resolving `use` directives
/// transitively, then handed to [`elaborate`].
pub type Library = HashMap<String, ChipDef>;

/// The result of elaborating one chip: its breadboard input groups (in
/// declaration-order-preserving name order) and output groups (in
/// declaration order).
pub struct Elaborated {
    pub inputs: HashMap<String, GroupId>,
    pub outputs: Vec<GroupId>,
}

/// Environment mapping identifiers in scope (formal inputs and `set`
/// bindings) to their breadboard group.
type Env = HashMap<String, GroupId>;

/// Elaborates `chip` (looked up in `library` by name) onto `board`,
/// returning its input/output groups.
pub fn elaborate(
    library: &Library,
    board: &mut Breadboard,
    chip_name: &str,
) -> Result<Elaborated, HdlError> {
    let chip = library
        .get(chip_name)
        .ok_or_else(|| HdlError::ChipNotFound(chip_name.to_string()))?;
    let mut env = Env::new();
    for (name, width) in &chip.inputs {
        let group = board.allocate(*width as usize, None);
        env.insert(name.clone(), group);
    }
    let outputs = elaborate_body(library, board, chip, &mut env)?;
    Ok(Elaborated {
        inputs: env
            .into_iter()
            .filter(|(name, _)| chip.inputs.contains_key(name))
            .collect(),
        outputs,
    })
}

/// Pre-allocates `chip`'s declared output groups, then walks its body,
/// wiring each `Out` expression's yielded group(s) onto the next unclaimed
/// output slot via `connect_group` and binding `Set` names into `env`. The
/// pre-allocated outputs are what `feedback` resolves to, per spec.md
/// §4.4: a chip's body can refer to its own (not-yet-driven) output groups
/// to close a combinational-into-sequential loop, but never by name.
fn elaborate_body(
    library: &Library,
    board: &mut Breadboard,
    chip: &ChipDef,
    env: &mut Env,
) -> Result<Vec<GroupId>, HdlError> {
    let outputs: Vec<GroupId> = chip
        .outputs
        .iter()
        .map(|&width| board.allocate(width as usize, None))
        .collect();
    let mut cursor = 0usize;
    for statement in &chip.body {
        match statement {
            Statement::Out(expr) => {
                let groups = eval_multi(library, board, env, &outputs, expr)?;
                for group in groups {
                    let target = outputs.get(cursor).copied().ok_or_else(|| {
                        HdlError::InvalidExpression(format!(
                            "chip '{}' declares {} output(s) but body produced more",
                            chip.name,
                            outputs.len()
                        ))
                    })?;
                    board.connect_group(group, target)?;
                    cursor += 1;
                }
            }
            Statement::Set(names, expr) => {
                let groups = eval_multi(library, board, env, &outputs, expr)?;
                if groups.len() != names.len() {
                    return Err(HdlError::InvalidExpression(format!(
                        "set binds {} name(s) but expression yielded {} group(s)",
                        names.len(),
                        groups.len()
                    )));
                }
                for (name, group) in names.iter().zip(groups) {
                    if name == "_" {
                        continue;
                    }
                    if env.insert(name.clone(), group).is_some() {
                        return Err(HdlError::DuplicateIdentifier(name.clone()));
                    }
                }
            }
            Statement::Use(_) => {}
        }
    }
    if cursor != outputs.len() {
        return Err(HdlError::InvalidExpression(format!(
            "chip '{}' declares {} output(s) but body produced {}",
            chip.name,
            outputs.len(),
            cursor
        )));
    }
    Ok(outputs)
}

/// Evaluates an expression to a single group, per the "expressions yield
/// exactly one GroupId except Array literals and the direct Out/Set
/// argument" resolution of the multi-output open question.
fn eval_one(
    library: &Library,
    board: &mut Breadboard,
    env: &Env,
    outputs: &[GroupId],
    expr: &Expression,
) -> Result<GroupId, HdlError> {
    let groups = eval_multi(library, board, env, outputs, expr)?;
    if groups.len() != 1 {
        return Err(HdlError::InvalidExpression(
            "expected a single-valued expression here".to_string(),
        ));
    }
    Ok(groups[0])
}

/// Evaluates an expression to zero or more groups. `outputs` is the
/// enclosing chip's (pre-allocated) output groups, consulted only by
/// `Call("feedback", _)`.
fn eval_multi(
    library: &Library,
    board: &mut Breadboard,
    env: &Env,
    outputs: &[GroupId],
    expr: &Expression,
) -> Result<Vec<GroupId>, HdlError> {
    match expr {
        Expression::Integer(n) => {
            let constant = if *n == 0 { board.zero } else { board.one };
            Ok(vec![constant])
        }
        Expression::Identifier(name) => {
            let group = env
                .get(name)
                .copied()
                .ok_or_else(|| HdlError::UnknownIdentifier(name.clone()))?;
            Ok(vec![group])
        }
        Expression::Indexed(name, index) => {
            let source = env
                .get(name)
                .copied()
                .ok_or_else(|| HdlError::UnknownIdentifier(name.clone()))?;
            let width = board.size_of(source)?;
            if *index >= width {
                return Err(HdlError::InvalidExpression(format!(
                    "index {index} out of range for '{name}' (width {width})"
                )));
            }
            let bit = board.allocate(1, None);
            board.connect(Wire {
                head: crate::breadboard::Pin::new(source, *index),
                tail: crate::breadboard::Pin::new(bit, 0),
            });
            Ok(vec![bit])
        }
        Expression::Array(elements) => {
            let width = elements.len();
            let group = board.allocate(width, None);
            for (i, element) in elements.iter().enumerate() {
                let bit = eval_one(library, board, env, outputs, element)?;
                if board.size_of(bit)? != 1 {
                    return Err(HdlError::InvalidExpression(format!(
                        "array element {i} must be width 1"
                    )));
                }
                board.connect(Wire {
                    head: crate::breadboard::Pin::new(bit, 0),
                    tail: crate::breadboard::Pin::new(group, i),
                });
            }
            Ok(vec![group])
        }
        Expression::Call(name, args) => eval_call(library, board, env, outputs, name, args),
    }
}

fn eval_call(
    library: &Library,
    board: &mut Breadboard,
    env: &Env,
    outputs: &[GroupId],
    name: &str,
    args: &[(String, Expression)],
) -> Result<Vec<GroupId>, HdlError> {
    match name {
        "nand" => {
            let input = single_arg(board, env, library, outputs, args, "in")?;
            let width = board.size_of(input)?;
            if width != 2 {
                return Err(HdlError::InvalidExpression(format!(
                    "nand argument 'in' must be 2 bits wide, got {width}"
                )));
            }
            let (gate_in, gate_out) = primitives::nand(board);
            board.connect_group(input, gate_in)?;
            Ok(vec![gate_out])
        }
        "dff" => {
            let input = single_arg(board, env, library, outputs, args, "in")?;
            let (gate_in, gate_out) = primitives::dff(board);
            board.connect_group(input, gate_in)?;
            Ok(vec![gate_out])
        }
        "feedback" => {
            // Yields the enclosing chip's own (pre-allocated) output
            // groups, letting a body refer to its own not-yet-settled
            // output to close a sequential feedback loop (e.g. a register
            // or counter reading its previous value back into its next
            // combinational input). Never resolvable by name.
            Ok(outputs.to_vec())
        }
        _ => {
            let chip = library
                .get(name)
                .ok_or_else(|| HdlError::ChipNotFound(name.to_string()))?;
            let mut call_env = Env::new();
            for (arg_name, arg_expr) in args {
                let width = *chip.inputs.get(arg_name).ok_or_else(|| {
                    HdlError::InvalidExpression(format!(
                        "chip '{name}' has no input '{arg_name}'"
                    ))
                })?;
                let group = eval_one(library, board, env, outputs, arg_expr)?;
                let actual = board.size_of(group)?;
                if actual != width as usize {
                    return Err(HdlError::InvalidExpression(format!(
                        "argument '{arg_name}' to '{name}' expects width {width}, got {actual}"
                    )));
                }
                call_env.insert(arg_name.clone(), group);
            }
            elaborate_body(library, board, chip, &mut call_env)
        }
    }
}

fn single_arg(
    board: &mut Breadboard,
    env: &Env,
    library: &Library,
    outputs: &[GroupId],
    args: &[(String, Expression)],
    expected_name: &str,
) -> Result<GroupId, HdlError> {
    let (_, expr) = args
        .iter()
        .find(|(n, _)| n == expected_name)
        .ok_or_else(|| HdlError::InvalidExpression(format!("missing '{expected_name}' argument")))?;
    eval_one(library, board, env, outputs, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breadboard::Pin;

    fn lib_with_and() -> Library {
        let src = "chip my_not (a: 1) -> (1) { out nand(in: [a, a]) } \
                   chip my_and (a: 1, b: 1) -> (1) { \
                     set n = nand(in: [a, b]) \
                     out my_not(a: n) }";
        let chips = super::super::parser::Parser::new(src).parse_unit().unwrap();
        chips.into_iter().map(|c| (c.name.clone(), c)).collect()
    }

    #[test]
    fn elaborates_nand_chip_directly() {
        let src = "chip n (a: 1, b: 1) -> (1) { out nand(in: [a, b]) }";
        let chips = super::super::parser::Parser::new(src).parse_unit().unwrap();
        let library: Library = chips.into_iter().map(|c| (c.name.clone(), c)).collect();
        let mut board = Breadboard::new();
        let elaborated = elaborate(&library, &mut board, "n").unwrap();
        let a = elaborated.inputs["a"];
        let b = elaborated.inputs["b"];
        let out = elaborated.outputs[0];
        for (av, bv, expected) in [(0u8, 0u8, 1u8), (1, 1, 0)] {
            board.set(Pin::new(a, 0), av);
            board.set(Pin::new(b, 0), bv);
            board.tick();
            assert_eq!(board.get(Pin::new(out, 0)), Ok(expected));
        }
    }

    #[test]
    fn elaborates_chip_composed_from_another_chip() {
        let library = lib_with_and();
        let mut board = Breadboard::new();
        let elaborated = elaborate(&library, &mut board, "my_and").unwrap();
        let a = elaborated.inputs["a"];
        let b = elaborated.inputs["b"];
        let out = elaborated.outputs[0];
        board.set(Pin::new(a, 0), 1);
        board.set(Pin::new(b, 0), 1);
        board.tick();
        assert_eq!(board.get(Pin::new(out, 0)), Ok(1));
    }

    #[test]
    fn unknown_chip_is_an_error() {
        let library = Library::new();
        let mut board = Breadboard::new();
        let err = elaborate(&library, &mut board, "missing").unwrap_err();
        assert!(matches!(err, HdlError::ChipNotFound(_)));
    }

    #[test]
    fn mismatched_output_count_is_an_error() {
        let src = "chip bad (a: 1) -> (1, 1) { out a }";
        let chips = super::super::parser::Parser::new(src).parse_unit().unwrap();
        let library: Library = chips.into_iter().map(|c| (c.name.clone(), c)).collect();
        let mut board = Breadboard::new();
        let err = elaborate(&library, &mut board, "bad").unwrap_err();
        assert!(matches!(err, HdlError::InvalidExpression(_)));
    }
}
