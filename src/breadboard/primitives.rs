//! NAND and D-flip-flop bindings onto a [`Breadboard`]. Every other gate in
//! the HDL standard chip set is, in principle, reachable by composing these
//! two primitives through the elaborator; the elaborator special-cases them
//! (`nand`, `dff`) rather than expressing them in HDL, since they are the
//! breadboard's only non-wire primitives.

use super::{Breadboard, Callback, CallbackCtx, GroupId, Pin};

/// Allocates a NAND gate: a 2-bit input group whose callback recomputes a
/// 1-bit output as `NOT(in[0] AND in[1])` on every change. Returns
/// `(input, output)`.
pub fn nand(board: &mut Breadboard) -> (GroupId, GroupId) {
    let output = board.allocate(1, None);
    let mut ctx = CallbackCtx::default();
    ctx.slots[0] = output;
    let input = board.allocate(2, Some(Callback::new(ctx, nand_callback)));
    (input, output)
}

fn nand_callback(
    ctx: &CallbackCtx,
    _id: GroupId,
    values: &[super::Signal],
    board: &mut super::BoardHandle,
) {
    let output = ctx.slots[0];
    let result = if values[0] == 0 || values[1] == 0 { 1 } else { 0 };
    board.set(Pin::new(output, 0), result);
}

/// Allocates a D-flip-flop: a 1-bit input group, a 1-bit output group, and
/// an internal load-gate wired from the breadboard's CLK. Nand2Tetris
/// defines the clocked primitive such that `out(t) == in(t-1)`: the value
/// present on `in` at a rising edge is not visible on `out` until the
/// *following* rising edge. This is implemented with a master-slave style
/// internal staging group: each rising edge first publishes the previously
/// staged value to `output`, then re-stages the current `input` for the
/// next edge. Returns `(input, output)`.
pub fn dff(board: &mut Breadboard) -> (GroupId, GroupId) {
    let output = board.allocate(1, None);
    let input = board.allocate(1, None);
    let staged = board.allocate(1, None);
    let mut ctx = CallbackCtx::default();
    ctx.slots[0] = input;
    ctx.slots[1] = output;
    ctx.slots[2] = staged;
    let load_gate = board.allocate(1, Some(Callback::new(ctx, dff_callback)));
    board.connect(super::Wire {
        head: Pin::new(board.clk, 0),
        tail: Pin::new(load_gate, 0),
    });
    (input, output)
}

fn dff_callback(
    ctx: &CallbackCtx,
    _id: GroupId,
    values: &[super::Signal],
    board: &mut super::BoardHandle,
) {
    if values[0] == 1 {
        let input = ctx.slots[0];
        let output = ctx.slots[1];
        let staged = ctx.slots[2];
        let previous = board.get(Pin::new(staged, 0));
        board.set(Pin::new(output, 0), previous);
        let current = board.get(Pin::new(input, 0));
        board.set(Pin::new(staged, 0), current);
    }
}
