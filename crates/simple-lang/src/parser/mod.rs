//! The parser core.
//!
//! A recursive-descent driver that threads a *current control node* and a
//! *current scope* through the grammar, emitting IR nodes leaves-first and
//! wiring them into the scope as it goes. Split across this module (the
//! driver, scope/control bookkeeping, loop jump handling) and its
//! [`expr`]/[`stmt`] submodules (the grammar itself) purely for file size —
//! all three are one inherent `impl Parser` spread across files.

mod expr;
mod stmt;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ir::{Graph, NodeId};
use crate::scope::Scope;
use crate::ssa::{LoopCtx, Reserved};
use crate::structs::StructRegistry;
use crate::ty::Ty;
use crate::lexer::Lexer;
use simple_base::{Interner, Span, Symbol};

/// One active loop's bookkeeping: its [`LoopCtx`] (φ/back-edge wiring),
/// the scope depth to prune `break`/`continue` jumps back down to, and the
/// accumulated break/continue target scopes.
struct LoopFrame {
    ctx: LoopCtx,
    entry_depth: usize,
    break_scope: Option<Scope<NodeId>>,
    continue_scope: Option<Scope<NodeId>>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(crate) interner: Interner,
    pub(crate) reserved: Reserved,
    pub(crate) graph: Graph,
    pub(crate) structs: StructRegistry,
    pub(crate) scope: Scope<NodeId>,
    loops: Vec<LoopFrame>,
    pub(crate) show_graph: bool,
}

/// The outcome of a successful parse: the finished graph and the
/// bits needed to render it afterwards (`#showGraph;`, or a CLI switch).
pub struct ParseOutput {
    pub graph: Graph,
    pub interner: Interner,
    pub structs: StructRegistry,
    pub stop: NodeId,
    pub show_graph: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, arg0_ty: Ty) -> Self {
        let mut interner = Interner::new();
        let reserved = Reserved { ctrl: interner.intern("$ctrl"), arg0: interner.intern("$arg0") };
        let mut graph = Graph::new();
        let mut scope = Scope::new();
        scope.define(reserved.ctrl, graph.start());

        let arg0 = graph.arg(arg0_ty);
        scope.define(reserved.arg0, arg0);
        let arg_name = interner.intern("arg");
        scope.define(arg_name, arg0);

        Parser {
            lexer: Lexer::new(source),
            interner,
            reserved,
            graph,
            structs: StructRegistry::new(),
            scope,
            loops: Vec::new(),
            show_graph: false,
        }
    }

    /// Parses the whole program (the virtual outer block — `program :=
    /// block`, with no surrounding braces) and builds the Stop node from
    /// every `return` seen.
    pub fn parse_program(mut self) -> Result<ParseOutput> {
        while !self.lexer.is_eof() {
            self.parse_statement(true)?;
        }
        let stop = self.graph.finish();
        Ok(ParseOutput {
            graph: self.graph,
            interner: self.interner,
            structs: self.structs,
            stop,
            show_graph: self.show_graph,
        })
    }

    // --- control / scope bookkeeping -----------------------------------------

    pub(crate) fn ctrl(&self) -> NodeId {
        self.scope.lookup(self.reserved.ctrl).expect("$ctrl is always defined")
    }

    pub(crate) fn set_ctrl(&mut self, ctrl: NodeId) {
        self.scope.update(self.reserved.ctrl, ctrl);
    }

    /// Kills control after a `return`/`break`/`continue`: rebinds `$ctrl`
    /// to the dead-control constant. Code textually following this point,
    /// until the enclosing scope exits, is unreachable.
    pub(crate) fn kill_ctrl(&mut self) {
        let dead = self.graph.con(Ty::XControl);
        self.set_ctrl(dead);
    }

    /// Resolves `name` for a read or write. Inside a loop body this routes
    /// through the innermost [`LoopCtx`] so the first touch of a
    /// loop-head-visible name lazily materializes its φ; outside a loop
    /// it's a plain scope lookup.
    pub(crate) fn resolve(&mut self, name: Symbol) -> Option<NodeId> {
        match self.loops.last_mut() {
            Some(frame) => frame.ctx.touch(&mut self.graph, &mut self.scope, name),
            None => self.scope.lookup(name),
        }
    }

    /// `define`: binds a brand-new name in the innermost frame.
    /// Fatal `DuplicateDefinition` if the frame already has it (`int` decls
    /// and the struct-typed `T x` declaration both route through this).
    pub(crate) fn define(&mut self, name: Symbol, value: NodeId, span: Span) -> Result<()> {
        if !self.scope.define(name, value) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateDefinition(self.interner.resolve(name).to_string()),
                span,
            ));
        }
        Ok(())
    }

    /// Plain assignment to an *existing* name (`x = e;`, or the pointer half
    /// of `x.f = e;`). Unlike [`Parser::rebind`] (used only for memory
    /// aliases, which are always bound), this checks the name actually
    /// exists first so an unknown target is reported as `UndefinedName`
    /// rather than silently doing nothing.
    pub(crate) fn assign(&mut self, name: Symbol, value: NodeId, span: Span) -> Result<()> {
        if self.resolve(name).is_none() {
            return Err(ParseError::new(
                ParseErrorKind::UndefinedName(self.interner.resolve(name).to_string()),
                span,
            ));
        }
        self.scope.update(name, value);
        Ok(())
    }

    pub(crate) fn rebind(&mut self, name: Symbol, value: NodeId) {
        // A write still has to go through `resolve` first so that a loop
        // in progress gets the chance to materialize the φ *before* the
        // new value overwrites the binding — otherwise the φ's "head
        // value" operand would wrongly be the value this write is about
        // to replace.
        self.resolve(name);
        self.scope.update(name, value);
    }

    // --- error helpers --------------------------------------------------------

    pub(crate) fn err(&mut self, kind: ParseErrorKind) -> ParseError {
        let span = self.lexer.span_here();
        ParseError::new(kind, span)
    }

    pub(crate) fn expect_str(&mut self, s: &'static str) -> Result<()> {
        if self.lexer.match_str(s) {
            Ok(())
        } else {
            let found = self.describe_next();
            Err(self.err(ParseErrorKind::ExpectedToken { expected: s, found }))
        }
    }

    fn describe_next(&mut self) -> String {
        match self.lexer.peek() {
            Some(b) => format!("'{}'", b as char),
            None => "end of input".to_string(),
        }
    }

    /// An identifier that is not one of the reserved keywords.
    pub(crate) fn require_id(&mut self) -> Result<(Symbol, Span)> {
        let (text, span) = match self.lexer.match_id() {
            Some(pair) => pair,
            None => {
                let found = self.describe_next();
                return Err(self.err(ParseErrorKind::ExpectedToken { expected: "identifier", found }));
            }
        };
        if crate::keywords::is_keyword(text) {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedToken { expected: "identifier", found: format!("keyword '{text}'") },
                span,
            ));
        }
        Ok((self.interner.intern(text), span))
    }
}
