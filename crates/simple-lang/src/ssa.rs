//! The SSA/φ constructor.
//!
//! Builds on [`crate::scope::Scope`] without the scope type itself knowing
//! anything about φ-nodes or regions: `ssa` is the layer that knows both
//! "what a name means" (`Scope`) and "how the graph represents a merge"
//! ([`crate::ir::Graph`]), and wires the two together.

use crate::ir::Graph;
use crate::scope::Scope;
use crate::ir::NodeId;
use crate::ty::Ty;
use simple_base::Symbol;
use std::collections::HashMap;

/// The two reserved scope entries that aren't user-namable (`$` cannot
/// start a Simple identifier).
#[derive(Debug, Clone, Copy)]
pub struct Reserved {
    pub ctrl: Symbol,
    pub arg0: Symbol,
}

/// Merges two scopes that diverged at a control-flow split (the two arms
/// of an `if`, or a `break`/`continue` jump rejoining the loop exit).
///
/// Builds one region whose two predecessors are each side's `$ctrl`, then
/// for every other name bound differently on the two sides, a φ rooted at
/// that region. Both scopes are assumed to have identical key sets in
/// every frame (checked only at the top frame — a count comparison is
/// sufficient since neither side may remove a binding); a mismatch there
/// is reported as the first name present on one side but not the other,
/// for the caller to turn into a `DivergentDefinition` error.
pub fn merge_scopes(
    graph: &mut Graph,
    reserved: &Reserved,
    a: &Scope<NodeId>,
    b: &Scope<NodeId>,
) -> Result<Scope<NodeId>, Symbol> {
    let a_top: std::collections::HashSet<_> = a.names_in_top().into_iter().collect();
    let b_top: std::collections::HashSet<_> = b.names_in_top().into_iter().collect();
    if a_top.len() != b_top.len() {
        let culprit = a_top
            .symmetric_difference(&b_top)
            .next()
            .copied()
            .expect("differing-size sets have a symmetric difference");
        return Err(culprit);
    }

    let ctrl_a = a.lookup(reserved.ctrl).expect("$ctrl always defined");
    let ctrl_b = b.lookup(reserved.ctrl).expect("$ctrl always defined");
    let region = graph.region(vec![ctrl_a, ctrl_b]);
    log::debug!("merging scopes into region {region:?}");

    let mut merged = a.clone();
    merged.update(reserved.ctrl, region);

    let names = a.snapshot();
    let mut phi_count = 0;
    for (name, a_val) in names {
        if name == reserved.ctrl {
            continue;
        }
        let Some(b_val) = b.lookup(name) else {
            return Err(name);
        };
        if a_val != b_val {
            let ty = Ty::merge(graph.ty(a_val), graph.ty(b_val));
            let phi = graph.phi2(region, a_val, b_val, ty);
            merged.update(name, phi);
            phi_count += 1;
        }
    }
    log::debug!("merge produced {phi_count} phi(s)");
    Ok(merged)
}

/// A loop-scope variant: the eagerly-φ'd clone opened at the top of a
/// `while`. Wraps the plain [`Scope`] lookups/updates the parser already
/// does, lazily materializing a loop φ for each name the first time the
/// loop body reads or writes it.
pub struct LoopCtx {
    pub region: NodeId,
    /// Every name (and memory alias) visible at the moment the loop
    /// opened, with its value then. Only these names are eligible for a
    /// loop φ — a name freshly declared inside the body never is, even if
    /// it happens to shadow an outer name — it's only eligible if it was
    /// visible in the loop-head scope at the moment the loop opened.
    head_snapshot: HashMap<Symbol, NodeId>,
    phied: HashMap<Symbol, NodeId>,
}

impl LoopCtx {
    /// Opens a loop region with `entry` (control on falling into the loop)
    /// as its first predecessor and a deferred second (back-edge)
    /// predecessor, snapshotting `head_scope` as the set of names eligible
    /// for a loop φ.
    pub fn open(graph: &mut Graph, entry: NodeId, head_scope: &Scope<NodeId>) -> Self {
        let region = graph.region_in_progress(entry);
        log::debug!("opening loop region {region:?}");
        LoopCtx { region, head_snapshot: head_scope.snapshot(), phied: HashMap::new() }
    }

    /// Resolves `name` for a read or write inside the loop body. On the
    /// first touch of a name visible at the loop head, materializes a
    /// loop φ (first operand: the head value; second: deferred) and
    /// rebinds `name` in `scope` to that φ, so every later reference in
    /// the body — including this one — sees the φ. A name not present at
    /// the loop head (a fresh local the body itself declared) is resolved
    /// as a plain scope lookup with no φ involved. Returns `None` if
    /// `name` isn't bound anywhere (an undefined-name error, for the
    /// caller to report).
    pub fn touch(&mut self, graph: &mut Graph, scope: &mut Scope<NodeId>, name: Symbol) -> Option<NodeId> {
        if let Some(&phi) = self.phied.get(&name) {
            return Some(phi);
        }
        let Some(&head_val) = self.head_snapshot.get(&name) else {
            return scope.lookup(name);
        };
        let ty = graph.ty(head_val);
        let phi = graph.phi_in_progress(self.region, head_val, ty);
        self.phied.insert(name, phi);
        scope.update(name, phi);
        Some(phi)
    }

    /// Closes the loop: wires the region's back-edge to `body_ctrl`, sets
    /// every phied name's deferred second operand to its current (post
    /// body) binding in `scope`, lets the peephole fold degenerate φs, and
    /// rebinds the folded result back into `scope`.
    ///
    /// `exit_scope` is the scope snapshot taken right after the loop
    /// predicate (before the body ran) that becomes the scope in effect
    /// after the loop. A name only touched for the first time inside the
    /// body never got its φ installed into `exit_scope` — it still holds
    /// the pre-loop head value there — so it's patched here too: whenever
    /// `exit_scope`'s binding for a phied name is still the head value (or
    /// the pre-fold φ itself, for a name already touched by the predicate),
    /// it's rebound to the finished, folded φ.
    pub fn close(self, graph: &mut Graph, scope: &mut Scope<NodeId>, exit_scope: &mut Scope<NodeId>, body_ctrl: NodeId) {
        log::debug!("closing loop region {:?} with {} phi(s)", self.region, self.phied.len());
        graph.set_region_backedge(self.region, body_ctrl);
        let head_snapshot = self.head_snapshot;
        for (name, phi) in self.phied {
            let back = scope.lookup(name).expect("a phied name stays bound for the life of the loop");
            let folded = graph.set_phi_backedge(phi, back);
            scope.update(name, folded);

            if let Some(exit_val) = exit_scope.lookup(name) {
                let head_val = head_snapshot.get(&name).copied();
                if Some(exit_val) == head_val || exit_val == phi {
                    exit_scope.update(name, folded);
                }
            }
        }
    }
}
