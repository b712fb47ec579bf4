/*!
breadboard - pin/wire arena and discrete-event propagation engine.

This is the substrate the HDL elaborator ([`crate::hdl::elaborator`]) targets:
every gate the elaborator instantiates is a group of pins on a `Breadboard`,
wired to its neighbors, with a callback that recomputes its output whenever
an input changes. [`Breadboard::tick`] pulses the well-known `CLK` pin high
then low, draining the resulting cascade of changes to a fixed point each
time.

Submodules:
    primitives - NAND and D-flip-flop bindings built on top of this arena.

Design notes carried over from the spec this crate implements:
  - Pins are plain `(GroupId, usize)` pairs, never references, so wiring can
    be cloned/reset trivially and nothing here fights the borrow checker.
  - Callbacks are small function-pointer-plus-context values
    ([`Callback`]), not boxed closures, since they sit on the hot path of
    `tick()`.
*/

pub mod primitives;

use crate::error::BreadboardError;
use std::collections::{HashSet, VecDeque};

/// Dense, stable, never-reused identifier for an allocated [`Group`].
pub type GroupId = usize;

/// A single bit signal, always 0 or 1.
pub type Signal = u8;

/// Addresses one signal: the `index`-th bit of the group `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin {
    pub id: GroupId,
    pub index: usize,
}

impl Pin {
    pub fn new(id: GroupId, index: usize) -> Self {
        Self { id, index }
    }
}

/// A directed pin-to-pin follow link: `tail` always takes on `head`'s value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    pub head: Pin,
    pub tail: Pin,
}

/// Callback invoked when any signal in a group changes, given the group id
/// and its current values. Modeled as a plain function pointer plus a small
/// captured context rather than a boxed closure, per the no-heap-closures
/// design note: the only context a primitive ever needs is a handful of
/// group ids, which fit in `ctx`.
#[derive(Clone, Copy)]
pub struct Callback {
    func: fn(ctx: &CallbackCtx, id: GroupId, values: &[Signal], board: &mut BoardHandle),
    ctx: CallbackCtx,
}

/// Small fixed-size context a callback may capture. NAND/DFF only ever need
/// to remember one or two group ids, so four `GroupId` slots cover every
/// primitive this crate defines without resorting to heap allocation.
#[derive(Clone, Copy, Default)]
pub struct CallbackCtx {
    pub slots: [GroupId; 4],
}

impl Callback {
    pub fn new(
        ctx: CallbackCtx,
        func: fn(&CallbackCtx, GroupId, &[Signal], &mut BoardHandle),
    ) -> Self {
        Self { func, ctx }
    }

    fn invoke(&self, id: GroupId, values: &[Signal], board: &mut BoardHandle) {
        (self.func)(&self.ctx, id, values, board);
    }
}

/// A thin handle callbacks use to drive the breadboard without re-entering
/// `Breadboard` methods that would need a second mutable borrow. It exposes
/// only `set`/`set_group`, which is all a combinational or sequential
/// primitive ever needs to do in response to a change.
pub struct BoardHandle<'a> {
    board: &'a mut Breadboard,
}

impl BoardHandle<'_> {
    pub fn set(&mut self, pin: Pin, value: Signal) {
        self.board.set(pin, value);
    }

    pub fn get(&self, pin: Pin) -> Signal {
        self.board.get(pin).unwrap_or(0)
    }
}

struct Group {
    callback: Option<Callback>,
    pins: Vec<Signal>,
}

/// FIFO queue of dirty pins with a presence set for deduplication, per
/// spec.md §4.1's "Dedup & fairness" requirement.
#[derive(Default)]
struct ChangeSet {
    queue: VecDeque<Pin>,
    present: HashSet<Pin>,
}

impl ChangeSet {
    fn enqueue(&mut self, pin: Pin) {
        if self.present.insert(pin) {
            self.queue.push_back(pin);
        }
    }

    fn dequeue(&mut self) -> Option<Pin> {
        let pin = self.queue.pop_front()?;
        self.present.remove(&pin);
        Some(pin)
    }

    fn more(&self) -> bool {
        !self.queue.is_empty()
    }
}

/// The pin-and-wire arena: the set of allocated groups, the fan-out map of
/// wires keyed by head pin, the pending-change queue, and the three
/// well-known single-bit groups (CLK, Zero, One).
pub struct Breadboard {
    groups: Vec<Group>,
    wires: std::collections::HashMap<Pin, Vec<Pin>>,
    changes: ChangeSet,
    pub clk: GroupId,
    pub zero: GroupId,
    pub one: GroupId,
}

impl Default for Breadboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Breadboard {
    pub fn new() -> Self {
        let mut board = Self {
            groups: Vec::new(),
            wires: std::collections::HashMap::new(),
            changes: ChangeSet::default(),
            clk: 0,
            zero: 0,
            one: 0,
        };
        board.clk = board.allocate(1, None);
        board.zero = board.allocate(1, None);
        board.one = board.allocate(1, None);
        board.set(Pin::new(board.one, 0), 1);
        board
    }

    /// Allocates a new pin group of `count` signals, initialized to 0, with
    /// an optional callback fired whenever any of its pins change.
    pub fn allocate(&mut self, count: usize, callback: Option<Callback>) -> GroupId {
        let id = self.groups.len();
        self.groups.push(Group {
            callback,
            pins: vec![0; count],
        });
        id
    }

    pub fn size_of(&self, id: GroupId) -> Result<usize, BreadboardError> {
        self.group(id).map(|g| g.pins.len())
    }

    fn group(&self, id: GroupId) -> Result<&Group, BreadboardError> {
        self.groups.get(id).ok_or(BreadboardError::InvalidId)
    }

    fn exists(&self, id: GroupId) -> bool {
        id < self.groups.len()
    }

    fn validate(&self, pin: Pin) -> Result<(), BreadboardError> {
        let group = self.group(pin.id)?;
        if pin.index >= group.pins.len() {
            return Err(BreadboardError::InvalidIndex);
        }
        Ok(())
    }

    /// Records a wire so that `wire.tail` always follows `wire.head`, and
    /// enqueues the head for propagation so an already-driven head
    /// immediately drives its new tail on the next `tick()`.
    pub fn connect(&mut self, wire: Wire) {
        self.validate(wire.head).expect("invalid head pin");
        self.validate(wire.tail).expect("invalid tail pin");
        self.wires.entry(wire.head).or_default().push(wire.tail);
        self.changes.enqueue(wire.head);
    }

    /// Connects every pin of `head` to the corresponding pin of `tail`. Both
    /// groups must exist and have equal size.
    pub fn connect_group(&mut self, head: GroupId, tail: GroupId) -> Result<(), BreadboardError> {
        if !self.exists(head) || !self.exists(tail) {
            return Err(BreadboardError::InvalidId);
        }
        let len = self.groups[head].pins.len();
        if len != self.groups[tail].pins.len() {
            return Err(BreadboardError::NonUniform);
        }
        for i in 0..len {
            self.connect(Wire {
                head: Pin::new(head, i),
                tail: Pin::new(tail, i),
            });
        }
        Ok(())
    }

    /// Sets `pin` to `value`. No-op if the pin already holds that value.
    /// `value` must be 0 or 1: any other value is a programming error.
    pub fn set(&mut self, pin: Pin, value: Signal) {
        self.validate(pin).expect("invalid pin");
        debug_assert!(value == 0 || value == 1, "signal must be 0 or 1");
        if self.get(pin) == Ok(value) {
            return;
        }
        self.groups[pin.id].pins[pin.index] = value;
        self.changes.enqueue(pin);
    }

    /// Sets every pin of `id` to the corresponding entry of `values`. Fires
    /// the group's callback once per changed pin (not batched), per the
    /// spec's resolution of the set_group-callback-multiplicity open
    /// question: this composes correctly with wire propagation, and every
    /// primitive callback in this crate is idempotent under repetition.
    pub fn set_group(&mut self, id: GroupId, values: &[Signal]) -> Result<(), BreadboardError> {
        if !self.exists(id) {
            return Err(BreadboardError::InvalidId);
        }
        if self.groups[id].pins.len() != values.len() {
            return Err(BreadboardError::NonUniform);
        }
        for (i, &value) in values.iter().enumerate() {
            self.set(Pin::new(id, i), value);
        }
        Ok(())
    }

    pub fn get(&self, pin: Pin) -> Result<Signal, BreadboardError> {
        self.validate(pin)?;
        Ok(self.groups[pin.id].pins[pin.index])
    }

    pub fn get_group(&self, id: GroupId) -> Result<Vec<Signal>, BreadboardError> {
        Ok(self.group(id)?.pins.clone())
    }

    /// Runs the settling algorithm: pulse CLK high, drain the change queue,
    /// pulse CLK low, drain again. Returns only once the queue is empty, at
    /// which point every tail reflects its head and CLK has pulsed exactly
    /// once.
    pub fn tick(&mut self) {
        self.set(Pin::new(self.clk, 0), 1);
        self.drain();
        self.set(Pin::new(self.clk, 0), 0);
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(pin) = self.changes.dequeue() {
            let values = self.groups[pin.id].pins.clone();
            let callback = self.groups[pin.id].callback;
            if let Some(cb) = callback {
                let mut handle = BoardHandle { board: self };
                cb.invoke(pin.id, &values, &mut handle);
            }
            let value = self.groups[pin.id].pins[pin.index];
            if let Some(children) = self.wires.get(&pin).cloned() {
                for child in children {
                    self.set(child, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let mut board = Breadboard::new();
        let g = board.allocate(1, None);
        board.set(Pin::new(g, 0), 1);
        assert_eq!(board.get(Pin::new(g, 0)), Ok(1));
    }

    #[test]
    fn connected_wire_follows_head_after_tick() {
        let mut board = Breadboard::new();
        let head = board.allocate(1, None);
        let tail = board.allocate(1, None);
        board.connect(Wire {
            head: Pin::new(head, 0),
            tail: Pin::new(tail, 0),
        });
        board.set(Pin::new(head, 0), 1);
        board.tick();
        assert_eq!(board.get(Pin::new(tail, 0)), Ok(1));
    }

    #[test]
    fn connect_group_wires_every_index() {
        let mut board = Breadboard::new();
        let head = board.allocate(4, None);
        let tail = board.allocate(4, None);
        board.connect_group(head, tail).unwrap();
        board.set_group(head, &[1, 0, 1, 1]).unwrap();
        board.tick();
        assert_eq!(board.get_group(tail), Ok(vec![1, 0, 1, 1]));
    }

    #[test]
    fn connect_group_rejects_mismatched_size() {
        let mut board = Breadboard::new();
        let head = board.allocate(2, None);
        let tail = board.allocate(3, None);
        assert_eq!(
            board.connect_group(head, tail),
            Err(BreadboardError::NonUniform)
        );
    }

    #[test]
    fn tick_pulses_clk_up_then_down() {
        let mut board = Breadboard::new();
        let clk = board.clk;
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        // CLK itself has no callback in the base arena; this test observes
        // the pulse by sampling CLK mid-tick is not possible without a
        // callback, so instead we assert CLK settles back to 0 after tick.
        let _ = calls;
        board.tick();
        assert_eq!(board.get(Pin::new(clk, 0)), Ok(0));
    }

    #[test]
    fn one_and_zero_hold_constants() {
        let board = Breadboard::new();
        assert_eq!(board.get(Pin::new(board.one, 0)), Ok(1));
        assert_eq!(board.get(Pin::new(board.zero, 0)), Ok(0));
    }
}
