//! Tagged-sum AST for HDL source, per the "dynamic dispatch over AST" design
//! note: plain enums dispatched on by the elaborator, not trait objects, so
//! nodes stay contiguous and cheap to walk.

use std::collections::HashMap;
use std::fmt;

/// A parsed chip definition: its formal inputs (name -> bit width), its
/// output widths (in declaration order, unnamed), and its statement body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipDef {
    pub name: String,
    pub inputs: HashMap<String, u16>,
    pub outputs: Vec<u16>,
    pub body: Vec<Statement>,
}

/// A statement inside a chip body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `out expr` - binds the next unclaimed output(s) to `expr`.
    Out(Expression),
    /// `set a, b, ... = expr` - binds names in the environment to the
    /// group ids yielded by `expr`. `_` discards the corresponding id.
    Set(Vec<String>, Expression),
    /// `use "path"` - already resolved transitively at parse time; a no-op
    /// at elaboration.
    Use(String),
}

/// An expression appearing in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// An integer literal: `0` means the constant-zero group, any other
    /// value means the constant-one group.
    Integer(i64),
    /// A bare identifier, looked up in the current chip's environment.
    Identifier(String),
    /// `name.index` - a single bit pulled out of a wider group.
    Indexed(String, usize),
    /// `[e0, e1, ..]` - packs each (width-1) element into a fresh group.
    Array(Vec<Expression>),
    /// `name(arg: expr, ...)` - a chip instantiation (or `nand`/`dff`/
    /// `feedback`, which the elaborator special-cases).
    Call(String, Vec<(String, Expression)>),
}

/// Prints `ast` back into the surface syntax of spec.md §4.3, with `inputs`
/// keys sorted lexically so the output is stable regardless of the
/// `HashMap`'s iteration order. `parser::Parser::parse_unit` must accept
/// the result and reproduce an equal [`ChipDef`] (spec.md §8's round-trip
/// invariant: `parse(print(ast)) == ast` up to that canonical key order).
impl fmt::Display for ChipDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted_inputs: Vec<(&String, &u16)> = self.inputs.iter().collect();
        sorted_inputs.sort_by(|a, b| a.0.cmp(b.0));
        let input_list = sorted_inputs
            .iter()
            .map(|(name, width)| format!("{name}: {width}"))
            .collect::<Vec<_>>()
            .join(", ");
        let output_list = self
            .outputs
            .iter()
            .map(|width| width.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "chip {} ({input_list}) -> ({output_list}) {{", self.name)?;
        for statement in &self.body {
            writeln!(f, "  {statement}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Out(expr) => write!(f, "out {expr}"),
            Statement::Set(names, expr) => write!(f, "set {} = {expr}", names.join(", ")),
            Statement::Use(path) => write!(f, "use \"{path}\""),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(n) => write!(f, "{n}"),
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::Indexed(name, index) => write!(f, "{name}.{index}"),
            Expression::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Expression::Call(name, args) => {
                write!(f, "{name}(")?;
                for (i, (arg_name, arg_expr)) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg_name}: {arg_expr}")?;
                }
                write!(f, ")")
            }
        }
    }
}
