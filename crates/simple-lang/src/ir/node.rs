//! Node shapes for the Sea-of-Nodes graph.
//!
//! Nodes live in one flat [`crate::ir::graph::Graph`] arena and reference
//! each other by stable [`NodeId`] index rather than by owning pointers —
//! the graph is cyclic (loop back-edges, loop φs) so ownership edges don't
//! work here the way they do in a tree-shaped AST.

use crate::structs::{FieldId, StructId};
use crate::ty::Ty;

/// A stable index into a [`crate::ir::graph::Graph`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An operand that may not be known yet at construction time.
///
/// Three spots in the grammar produce a node before its second operand is
/// available: a loop region's back-edge, a loop φ's second input, and (for
/// symmetry with those two) any right-hand side that is only fully known
/// once a forward reference resolves. All three are unified here rather
/// than given three ad hoc "half-built node" representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Pending,
    Set(NodeId),
}

impl Operand {
    pub fn get(self) -> Option<NodeId> {
        match self {
            Operand::Set(id) => Some(id),
            Operand::Pending => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Operand::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Le,
}

/// One node in the Sea-of-Nodes graph. Control, data, and memory values are
/// all just nodes — nothing here distinguishes "instruction" from "value".
#[derive(Debug, Clone)]
pub enum Node {
    /// The unique entry point; every function body's control chain starts
    /// by projecting off of it.
    Start,
    /// The program's single implicit integer argument, bound as both
    /// `$arg0` and the ordinary identifier `arg` in the outermost scope.
    Arg,
    /// A constant of whatever [`Ty`] the graph records for this node.
    Con,
    BinOp {
        op: BinOpKind,
        lhs: NodeId,
        rhs: Operand,
    },
    /// Boolean complement, used to desugar `!=` as `!(a == b)` and
    /// `a >= b` / `a > b` via operand swap plus negation where needed.
    Not {
        input: NodeId,
    },
    /// `if` control split: one predecessor control, one boolean predicate.
    /// Downstream, two [`Node::Proj`] nodes pick the true/false successor.
    If {
        ctrl: NodeId,
        pred: NodeId,
    },
    /// Selects one control output of an [`Node::If`]. `is_true` picks the
    /// taken-when-nonzero edge.
    Proj {
        input: NodeId,
        is_true: bool,
    },
    /// Control-flow merge point. `preds` has one entry per incoming edge;
    /// for a loop head the second entry starts `Operand::Pending` until
    /// the loop body's back-edge is parsed and `in_progress` is cleared.
    Region {
        preds: Vec<Operand>,
        in_progress: bool,
    },
    /// Data-flow merge, one per variable (or memory alias) live across a
    /// control merge. Tracks the same region.
    Phi {
        region: NodeId,
        inputs: Vec<Operand>,
    },
    Return {
        ctrl: NodeId,
        data: NodeId,
    },
    /// The unique exit point, gathering every `return` in the function.
    Stop {
        returns: Vec<NodeId>,
    },
    /// `new StructName` — allocates a fresh, non-null instance.
    New {
        sty: StructId,
    },
    /// The initial memory-SSA token for one struct-field alias, projected
    /// off the unique [`Node::Start`] the moment its struct type is
    /// declared. Every alias's store chain bottoms out here.
    MemProj {
        field: FieldId,
    },
    /// Reads a struct field through the memory SSA chain.
    Load {
        mem: NodeId,
        ptr: NodeId,
        field: FieldId,
    },
    /// Writes a struct field, producing the next memory-SSA state for that
    /// field's alias.
    Store {
        mem: NodeId,
        ptr: NodeId,
        value: NodeId,
        field: FieldId,
    },
}

impl Node {
    pub fn is_region(&self) -> bool {
        matches!(self, Node::Region { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Node::Phi { .. })
    }
}
