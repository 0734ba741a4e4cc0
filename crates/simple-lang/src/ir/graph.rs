//! The Sea-of-Nodes graph itself: a flat, append-only arena of [`Node`]s
//! plus the peephole rules that fire the moment a node's operands are all
//! known (peephole-on-construction, suppressed for not-yet-finalized loop
//! regions and loop φs via `in_progress`/`Operand::Pending`).

use crate::ir::node::{BinOpKind, Node, NodeId, Operand};
use crate::structs::{FieldId, StructId};
use crate::ty::Ty;

pub struct Graph {
    nodes: Vec<Node>,
    tys: Vec<Ty>,
    keep_counts: Vec<u32>,
    start: NodeId,
    returns: Vec<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        let mut g = Graph {
            nodes: Vec::new(),
            tys: Vec::new(),
            keep_counts: Vec::new(),
            start: NodeId(0),
            returns: Vec::new(),
        };
        g.start = g.push(Node::Start, Ty::Control);
        g
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn arg(&mut self, ty: Ty) -> NodeId {
        self.push(Node::Arg, ty)
    }

    fn push(&mut self, node: Node, ty: Ty) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.tys.push(ty);
        self.keep_counts.push(0);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The number of live [`Node::Phi`] nodes in the graph — used by tests
    /// to check that redundant φs were actually folded away rather than
    /// merely being unreachable from the return the test inspects.
    pub fn phi_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_phi()).count()
    }

    pub fn ty(&self, id: NodeId) -> Ty {
        self.tys[id.index()]
    }

    fn set_ty(&mut self, id: NodeId, ty: Ty) {
        self.tys[id.index()] = ty;
    }

    // --- resource discipline -------------------------------------------------
    //
    // There is no garbage collector here: the arena is append-only and
    // nothing is ever physically removed. `keep_during` still mirrors the
    // spec's keep/unkeep discipline as a scoped RAII-style guard rather
    // than paired manual calls, so that code built on top of `Graph`
    // reads the same way it would against a compacting implementation,
    // and so tests can assert nothing leaks a keep past the span that
    // needed it.
    pub fn keep(&mut self, id: NodeId) {
        self.keep_counts[id.index()] += 1;
    }

    pub fn unkeep(&mut self, id: NodeId) {
        self.keep_counts[id.index()] -= 1;
    }

    pub fn keep_count(&self, id: NodeId) -> u32 {
        self.keep_counts[id.index()]
    }

    pub fn keep_during<R>(&mut self, ids: &[NodeId], f: impl FnOnce(&mut Graph) -> R) -> R {
        for &id in ids {
            self.keep(id);
        }
        let result = f(self);
        for &id in ids {
            self.unkeep(id);
        }
        result
    }

    // --- constants ------------------------------------------------------------

    pub fn con(&mut self, ty: Ty) -> NodeId {
        self.push(Node::Con, ty)
    }

    // --- arithmetic / comparison ------------------------------------------------

    /// Builds a binary op with only the left operand known yet. Call
    /// [`Graph::set_rhs`] once the right-hand side has been parsed, then
    /// the node is peepholed.
    pub fn bin_op_pending(&mut self, op: BinOpKind, lhs: NodeId) -> NodeId {
        self.push(Node::BinOp { op, lhs, rhs: Operand::Pending }, Ty::IntTop)
    }

    pub fn set_rhs(&mut self, id: NodeId, rhs: NodeId) -> NodeId {
        match &mut self.nodes[id.index()] {
            Node::BinOp { rhs: slot, .. } => *slot = Operand::Set(rhs),
            _ => panic!("set_rhs on a non-BinOp node"),
        }
        self.peephole(id)
    }

    pub fn bin_op(&mut self, op: BinOpKind, lhs: NodeId, rhs: NodeId) -> NodeId {
        let id = self.bin_op_pending(op, lhs);
        self.set_rhs(id, rhs)
    }

    pub fn not(&mut self, input: NodeId) -> NodeId {
        let id = self.push(Node::Not { input }, Ty::IntTop);
        self.peephole(id)
    }

    // --- control flow -----------------------------------------------------------

    pub fn if_node(&mut self, ctrl: NodeId, pred: NodeId) -> (NodeId, NodeId, NodeId) {
        let if_id = self.push(Node::If { ctrl, pred }, Ty::Control);
        let t = self.push(Node::Proj { input: if_id, is_true: true }, Ty::Control);
        let f = self.push(Node::Proj { input: if_id, is_true: false }, Ty::Control);
        (if_id, t, f)
    }

    pub fn region(&mut self, preds: Vec<NodeId>) -> NodeId {
        let preds = preds.into_iter().map(Operand::Set).collect();
        self.push(Node::Region { preds, in_progress: false }, Ty::Control)
    }

    /// Opens a loop head region: one known predecessor (falling into the
    /// loop) and one pending predecessor (the back-edge, filled in by
    /// [`Graph::set_region_backedge`] once the loop body has been parsed).
    pub fn region_in_progress(&mut self, entry: NodeId) -> NodeId {
        self.push(
            Node::Region { preds: vec![Operand::Set(entry), Operand::Pending], in_progress: true },
            Ty::Control,
        )
    }

    pub fn set_region_backedge(&mut self, region: NodeId, val: NodeId) {
        match &mut self.nodes[region.index()] {
            Node::Region { preds, in_progress } => {
                preds[1] = Operand::Set(val);
                *in_progress = false;
            }
            _ => panic!("set_region_backedge on a non-Region node"),
        }
    }

    pub fn is_in_progress(&self, id: NodeId) -> bool {
        match &self.nodes[id.index()] {
            Node::Region { in_progress, .. } => *in_progress,
            _ => false,
        }
    }

    // --- phi -----------------------------------------------------------------

    pub fn phi2(&mut self, region: NodeId, a: NodeId, b: NodeId, ty: Ty) -> NodeId {
        let id = self.push(Node::Phi { region, inputs: vec![Operand::Set(a), Operand::Set(b)] }, ty);
        self.peephole(id)
    }

    /// Opens a loop φ: one known input (the value on entry to the loop)
    /// and one pending input (the value flowing around the back-edge).
    pub fn phi_in_progress(&mut self, region: NodeId, entry: NodeId, ty: Ty) -> NodeId {
        self.push(Node::Phi { region, inputs: vec![Operand::Set(entry), Operand::Pending] }, ty)
    }

    pub fn set_phi_backedge(&mut self, phi: NodeId, val: NodeId) -> NodeId {
        match &mut self.nodes[phi.index()] {
            Node::Phi { inputs, .. } => inputs[1] = Operand::Set(val),
            _ => panic!("set_phi_backedge on a non-Phi node"),
        }
        self.peephole(phi)
    }

    pub fn phi_region(&self, phi: NodeId) -> NodeId {
        match &self.nodes[phi.index()] {
            Node::Phi { region, .. } => *region,
            _ => panic!("phi_region on a non-Phi node"),
        }
    }

    // --- return / stop -----------------------------------------------------------

    pub fn return_node(&mut self, ctrl: NodeId, data: NodeId) -> NodeId {
        let id = self.push(Node::Return { ctrl, data }, Ty::XControl);
        self.returns.push(id);
        id
    }

    /// Builds the unique `Stop` node gathering every `return` seen so far.
    /// Called once, after the whole program has been parsed.
    pub fn finish(&mut self) -> NodeId {
        let returns = self.returns.clone();
        self.push(Node::Stop { returns }, Ty::XControl)
    }

    // --- structs / memory --------------------------------------------------------

    pub fn new_struct(&mut self, sty: StructId) -> NodeId {
        self.push(Node::New { sty }, Ty::ptr_of(sty))
    }

    /// Projects the initial memory-SSA token for a freshly declared field
    /// alias off the start node. Called once per field, at struct
    /// declaration time.
    pub fn mem_proj(&mut self, field: FieldId) -> NodeId {
        self.push(Node::MemProj { field }, Ty::mem())
    }

    /// Loads `field` off `ptr` through memory state `mem`. When `mem` is
    /// itself the very store that just wrote this exact field through this
    /// exact pointer, the load is redundant and forwards the stored value
    /// directly rather than allocating a new node — the memory-SSA analogue
    /// of folding `x = 5; return x;` to `return 5;`.
    pub fn load(&mut self, mem: NodeId, ptr: NodeId, field: FieldId, ty: Ty) -> NodeId {
        if let Node::Store { ptr: store_ptr, value, field: store_field, .. } = self.nodes[mem.index()] {
            if store_ptr == ptr && store_field == field {
                return value;
            }
        }
        self.push(Node::Load { mem, ptr, field }, ty)
    }

    pub fn store(&mut self, mem: NodeId, ptr: NodeId, value: NodeId, field: FieldId) -> NodeId {
        let ty = self.ty(mem);
        self.push(Node::Store { mem, ptr, value, field }, ty)
    }

    // --- peephole -----------------------------------------------------------------

    /// Re-evaluates `id` once its operands are fully known, folding
    /// constant arithmetic/comparisons and collapsing redundant φs.
    /// Nodes still `in_progress` (an unfinished loop region, or a φ whose
    /// back-edge hasn't been patched in yet) are left alone — folding them
    /// early would bake in a value from before the loop body ran.
    fn peephole(&mut self, id: NodeId) -> NodeId {
        if self.is_in_progress(id) {
            return id;
        }
        match self.nodes[id.index()].clone() {
            Node::BinOp { op, lhs, rhs: Operand::Set(rhs) } => {
                if let (Some(a), Some(b)) = (self.as_int_const(lhs), self.as_int_const(rhs)) {
                    if let Some(folded) = fold_int_binop(op, a, b) {
                        return self.con(folded);
                    }
                }
                self.set_ty(id, infer_binop_ty(op, self.ty(lhs), self.ty(rhs)));
                id
            }
            Node::Not { input } => {
                if let Some(v) = self.as_int_const(input) {
                    return self.con(Ty::bool_const(v == 0));
                }
                id
            }
            Node::Phi { inputs, .. } => {
                if let [Operand::Set(a), Operand::Set(b)] = inputs[..] {
                    if a == b {
                        return a;
                    }
                    // A loop back-edge that never actually assigns this name
                    // feeds the φ its own id (the last live binding was the φ
                    // itself). Ignoring that self-reference, only one operand
                    // is left, so the φ is degenerate and folds to it.
                    if a == id {
                        return b;
                    }
                    if b == id {
                        return a;
                    }
                    self.set_ty(id, Ty::merge(self.ty(a), self.ty(b)));
                }
                id
            }
            _ => id,
        }
    }

    /// Re-runs the peephole on a node whose inputs changed after
    /// construction — used by [`Graph::set_phi_backedge`] and anywhere a
    /// back-patched loop value needs a second look once the loop closes.
    pub fn repeephole(&mut self, id: NodeId) -> NodeId {
        self.peephole(id)
    }

    fn as_int_const(&self, id: NodeId) -> Option<i64> {
        match self.nodes[id.index()] {
            Node::Con => self.ty(id).as_int_const(),
            _ => None,
        }
    }

    // --- visualization --------------------------------------------------------

    /// Renders the whole arena as GraphViz `dot` text: one node per line, one
    /// edge per use-def input. This is text generation only — an actual
    /// graph renderer is a separate concern this crate doesn't own.
    pub fn to_graphviz(&self) -> String {
        let mut out = String::from("digraph sea_of_nodes {\n");
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            out.push_str(&format!("  n{i} [label=\"{}\"];\n", node_label(node)));
            for input in node_inputs(node) {
                out.push_str(&format!("  n{} -> n{i};\n", input.index()));
            }
            let _ = id;
        }
        out.push_str("}\n");
        out
    }
}

fn node_label(node: &Node) -> String {
    match node {
        Node::Start => "Start".to_string(),
        Node::Arg => "Arg".to_string(),
        Node::Con => "Con".to_string(),
        Node::BinOp { op, .. } => format!("{op:?}"),
        Node::Not { .. } => "Not".to_string(),
        Node::If { .. } => "If".to_string(),
        Node::Proj { is_true, .. } => if *is_true { "True".to_string() } else { "False".to_string() },
        Node::Region { in_progress, .. } => if *in_progress { "Region*".to_string() } else { "Region".to_string() },
        Node::Phi { .. } => "Phi".to_string(),
        Node::Return { .. } => "Return".to_string(),
        Node::Stop { .. } => "Stop".to_string(),
        Node::New { .. } => "New".to_string(),
        Node::Load { field, .. } => format!("Load(f{})", field.index()),
        Node::Store { field, .. } => format!("Store(f{})", field.index()),
        Node::MemProj { field } => format!("MemProj(f{})", field.index()),
    }
}

fn node_inputs(node: &Node) -> Vec<NodeId> {
    match node {
        Node::Start | Node::Arg | Node::Con | Node::MemProj { .. } => vec![],
        Node::BinOp { lhs, rhs, .. } => {
            let mut v = vec![*lhs];
            if let Operand::Set(r) = rhs {
                v.push(*r);
            }
            v
        }
        Node::Not { input } => vec![*input],
        Node::If { ctrl, pred } => vec![*ctrl, *pred],
        Node::Proj { input, .. } => vec![*input],
        Node::Region { preds, .. } => preds.iter().filter_map(|p| p.get()).collect(),
        Node::Phi { region, inputs } => {
            let mut v = vec![*region];
            v.extend(inputs.iter().filter_map(|p| p.get()));
            v
        }
        Node::Return { ctrl, data } => vec![*ctrl, *data],
        Node::Stop { returns } => returns.clone(),
        Node::New { .. } => vec![],
        Node::Load { mem, ptr, .. } => vec![*mem, *ptr],
        Node::Store { mem, ptr, value, .. } => vec![*mem, *ptr, *value],
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

fn fold_int_binop(op: BinOpKind, a: i64, b: i64) -> Option<Ty> {
    match op {
        BinOpKind::Add => Some(Ty::int_const(a.wrapping_add(b))),
        BinOpKind::Sub => Some(Ty::int_const(a.wrapping_sub(b))),
        BinOpKind::Mul => Some(Ty::int_const(a.wrapping_mul(b))),
        BinOpKind::Div => {
            if b == 0 {
                None
            } else {
                Some(Ty::int_const(a.wrapping_div(b)))
            }
        }
        BinOpKind::Eq => Some(Ty::bool_const(a == b)),
        BinOpKind::Lt => Some(Ty::bool_const(a < b)),
        BinOpKind::Le => Some(Ty::bool_const(a <= b)),
    }
}

fn infer_binop_ty(_op: BinOpKind, _lhs: Ty, _rhs: Ty) -> Ty {
    // Anything that reaches here didn't constant-fold, so it's some
    // runtime integer or boolean-as-integer — both bottom of the lattice.
    Ty::IntBot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_folds_arithmetic() {
        let mut g = Graph::new();
        let a = g.con(Ty::int_const(2));
        let b = g.con(Ty::int_const(3));
        let sum = g.bin_op(BinOpKind::Add, a, b);
        assert_eq!(g.ty(sum), Ty::IntConst(5));
    }

    #[test]
    fn division_by_constant_zero_does_not_fold() {
        let mut g = Graph::new();
        let a = g.con(Ty::int_const(7));
        let zero = g.con(Ty::int_const(0));
        let div = g.bin_op(BinOpKind::Div, a, zero);
        assert!(matches!(g.node(div), Node::BinOp { .. }));
    }

    #[test]
    fn redundant_phi_collapses_to_its_single_value() {
        let mut g = Graph::new();
        let region = g.region(vec![g.start(), g.start()]);
        let v = g.con(Ty::int_const(9));
        let phi = g.phi2(region, v, v, Ty::IntConst(9));
        assert_eq!(phi, v);
    }

    #[test]
    fn distinct_phi_inputs_stay_a_phi() {
        let mut g = Graph::new();
        let region = g.region(vec![g.start(), g.start()]);
        let a = g.con(Ty::int_const(1));
        let b = g.con(Ty::int_const(2));
        let phi = g.phi2(region, a, b, Ty::IntBot);
        assert!(matches!(g.node(phi), Node::Phi { .. }));
    }

    #[test]
    fn loop_phi_backedge_is_not_folded_while_in_progress() {
        let mut g = Graph::new();
        let region = g.region_in_progress(g.start());
        let entry = g.con(Ty::int_const(0));
        let phi = g.phi_in_progress(region, entry, Ty::IntTop);
        // Even if the (eventual) back-edge value equals the entry value,
        // nothing folds until the region is closed.
        assert!(g.is_in_progress(region));
        g.set_region_backedge(region, entry);
        let phi = g.set_phi_backedge(phi, entry);
        assert_eq!(phi, entry);
    }

    #[test]
    fn keep_during_tracks_nesting() {
        let mut g = Graph::new();
        let c = g.con(Ty::int_const(1));
        g.keep_during(&[c], |g| {
            assert_eq!(g.keep_count(c), 1);
        });
        assert_eq!(g.keep_count(c), 0);
    }

    #[test]
    fn mem_proj_is_independent_per_field() {
        let mut g = Graph::new();
        let a = g.mem_proj(FieldId::new(0));
        let b = g.mem_proj(FieldId::new(1));
        assert_ne!(a, b);
        assert_eq!(g.ty(a), Ty::Memory);
    }

    #[test]
    fn to_graphviz_includes_every_node() {
        let mut g = Graph::new();
        let c = g.con(Ty::int_const(1));
        let d = g.con(Ty::int_const(2));
        g.bin_op(BinOpKind::Add, c, d);
        let dot = g.to_graphviz();
        assert!(dot.starts_with("digraph sea_of_nodes {"));
        assert!(dot.contains("Con"));
    }
}
