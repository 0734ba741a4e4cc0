//! Statement grammar: `program`, `block`, `statement`, `decl`, `field`,
//! and the `struct`/`if`/`while`/`break`/`continue` constructs that
//! interleave scope management and SSA/φ construction with parsing.

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ir::{Node, NodeId};
use crate::memory;
use crate::parser::Parser;
use crate::ssa::{self, LoopCtx};
use crate::structs::StructId;
use crate::ty::Ty;
use simple_base::{Span, Symbol};

use super::LoopFrame;

impl<'a> Parser<'a> {
    /// `statement := 'return' expr ';' | 'int' decl | '{' block-body '}'
    ///             | 'if' '(' expr ')' statement ('else' statement)?
    ///             | 'while' '(' expr ')' statement
    ///             | 'break' ';' | 'continue' ';'
    ///             | 'struct' id '{' field+ '}' | '#showGraph' ';' | exprStmt`
    ///
    /// `is_outermost` gates `struct` declarations: legal only at the
    /// outermost lexical scope.
    pub(crate) fn parse_statement(&mut self, is_outermost: bool) -> Result<()> {
        if self.lexer.matchx("return") {
            return self.parse_return();
        }
        if self.lexer.matchx("int") {
            return self.parse_int_decl();
        }
        if self.lexer.match_str("{") {
            return self.parse_block();
        }
        if self.lexer.matchx("if") {
            return self.parse_if();
        }
        if self.lexer.matchx("while") {
            return self.parse_while();
        }
        if self.lexer.matchx("break") {
            return self.parse_jump(true);
        }
        if self.lexer.matchx("continue") {
            return self.parse_jump(false);
        }
        if self.lexer.matchx("struct") {
            return self.parse_struct_decl(is_outermost);
        }
        if self.lexer.match_str("#showGraph") {
            self.show_graph = true;
            return self.expect_str(";");
        }
        // A bare `;` is a no-op statement — chiefly useful as an empty
        // `else` arm (`if (x) int y = 1; else ;`), which the grammar's
        // `statement` production otherwise has no way to spell.
        if self.lexer.match_str(";") {
            return Ok(());
        }
        self.parse_expr_stmt_or_decl()
    }

    /// `'{' statement* '}'` — a nested block opens its own lexical frame
    /// and restores the scope-stack depth on every exit path.
    fn parse_block(&mut self) -> Result<()> {
        self.scope.push();
        log::debug!("entering block at depth {}", self.scope.depth());
        loop {
            if self.lexer.match_str("}") {
                log::debug!("leaving block at depth {}", self.scope.depth());
                self.scope.pop();
                return Ok(());
            }
            if self.lexer.is_eof() {
                self.scope.pop();
                return Err(self.err(ParseErrorKind::UnexpectedEof));
            }
            if let Err(e) = self.parse_statement(false) {
                self.scope.pop();
                return Err(e);
            }
        }
    }

    /// `'return' expr ';'`: emits the return node, attaches it to the stop
    /// node (done globally by [`crate::ir::Graph::finish`]), then kills
    /// control — everything textually after, until the enclosing scope
    /// exits, is dead code.
    fn parse_return(&mut self) -> Result<()> {
        let data = self.parse_expr()?;
        self.expect_str(";")?;
        let ctrl = self.ctrl();
        self.graph.return_node(ctrl, data);
        self.kill_ctrl();
        Ok(())
    }

    /// `'int' decl` where `decl := id '=' expr ';'`. An `int` declaration
    /// always carries an initializer — only the struct-typed declaration
    /// form, via the `exprStmt` ambiguity below, may omit one.
    fn parse_int_decl(&mut self) -> Result<()> {
        let (name, span) = self.require_id()?;
        self.expect_str("=")?;
        let value = self.parse_expr()?;
        self.expect_str(";")?;
        self.define(name, value, span)
    }

    /// `'struct' id '{' field+ '}'`, `field := 'int' id ';'`. Legal only at
    /// the outermost scope; registers the type, then binds one
    /// `$alias{k}` pseudo-variable per field to a fresh memory projection
    /// off the start node.
    fn parse_struct_decl(&mut self, is_outermost: bool) -> Result<()> {
        if !is_outermost {
            return Err(self.err(ParseErrorKind::StructNotTopLevel));
        }
        let (name, span) = self.require_id()?;
        if self.structs.lookup_by_name(name).is_some() {
            return Err(ParseError::new(
                ParseErrorKind::StructRedefined(self.interner.resolve(name).to_string()),
                span,
            ));
        }
        self.expect_str("{")?;
        let mut field_names = Vec::new();
        while !self.lexer.match_str("}") {
            if self.lexer.is_eof() {
                return Err(self.err(ParseErrorKind::UnexpectedEof));
            }
            if !self.lexer.matchx("int") {
                let found = self.describe_next();
                return Err(self.err(ParseErrorKind::ExpectedToken {
                    expected: "field declaration ('int name;')",
                    found,
                }));
            }
            let (field_name, _) = self.require_id()?;
            self.expect_str(";")?;
            field_names.push(field_name);
        }
        if field_names.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::EmptyStruct(self.interner.resolve(name).to_string()),
                span,
            ));
        }
        let sid = self.structs.declare(name, &field_names);
        let field_ids: Vec<_> = self.structs.get(sid).fields.iter().map(|f| f.field_id).collect();
        for field_id in field_ids {
            let alias = memory::alias_name(&mut self.interner, field_id);
            let proj = self.graph.mem_proj(field_id);
            // The outermost frame is exactly the bottom of the stack here:
            // `struct` is only reachable when `is_outermost` holds, which
            // the caller only ever passes at depth 1.
            self.scope.define(alias, proj);
        }
        Ok(())
    }

    /// `exprStmt := id ('.' id)? '=' expr ';'`, disambiguated from the
    /// struct-typed declaration `StructName varName ('=' expr)? ';'`
    /// by looking one identifier ahead with no backtracking: if the token
    /// right after the first identifier is itself an identifier, the first
    /// one must name a struct type.
    fn parse_expr_stmt_or_decl(&mut self) -> Result<()> {
        let (first, first_span) = self.require_id()?;
        if self.lexer.peek_is_id() {
            return self.parse_struct_var_decl(first, first_span);
        }
        if self.lexer.match_str(".") {
            let (field_name, field_span) = self.require_id()?;
            self.expect_str("=")?;
            let value = self.parse_expr()?;
            self.expect_str(";")?;
            let ptr = self.resolve(first).ok_or_else(|| {
                ParseError::new(ParseErrorKind::UndefinedName(self.interner.resolve(first).to_string()), first_span)
            })?;
            return self.store_field(ptr, field_name, field_span, value);
        }
        self.expect_str("=")?;
        let value = self.parse_expr()?;
        self.expect_str(";")?;
        self.assign(first, value, first_span)
    }

    /// The struct-typed declaration form: `type_name var_name ('=' expr)? ';'`.
    /// Omitting the initializer binds the variable to a null pointer of
    /// `type_name`.
    fn parse_struct_var_decl(&mut self, type_name: Symbol, type_span: Span) -> Result<()> {
        let sid = self.structs.lookup_by_name(type_name).ok_or_else(|| {
            ParseError::new(ParseErrorKind::UnknownStruct(self.interner.resolve(type_name).to_string()), type_span)
        })?;
        let (var_name, var_span) = self.require_id()?;
        let value = if self.lexer.match_str("=") {
            let expr_span = self.lexer.span_here();
            let v = self.parse_expr()?;
            self.check_struct_init_ty(sid, v, expr_span)?;
            v
        } else {
            self.graph.con(Ty::null_of(sid))
        };
        self.expect_str(";")?;
        self.define(var_name, value, var_span)
    }

    /// Type-checks a struct-typed declaration's initializer against the
    /// declared struct type:
    /// - a `new U` must have `U == T`;
    /// - a constant must be `null`;
    /// - anything else must have observed type exactly `T`.
    fn check_struct_init_ty(&mut self, sid: StructId, value: NodeId, span: Span) -> Result<()> {
        let expected = self.interner.resolve(self.structs.get(sid).name).to_string();
        match self.graph.node(value) {
            Node::New { sty } => {
                if *sty != sid {
                    let found = self.interner.resolve(self.structs.get(*sty).name).to_string();
                    return Err(ParseError::new(ParseErrorKind::TypeMismatch { expected, found }, span));
                }
            }
            Node::Con => {
                let ty = self.graph.ty(value);
                if !ty.is_untyped_null() && ty != Ty::null_of(sid) {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeMismatch { expected, found: format!("{ty:?}") },
                        span,
                    ));
                }
            }
            _ => {
                let ty = self.graph.ty(value);
                if ty.struct_id() != Some(sid) {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeMismatch { expected, found: format!("{ty:?}") },
                        span,
                    ));
                }
            }
        }
        Ok(())
    }

    /// `'if' '(' expr ')' statement ('else' statement)?`: clones the
    /// scope per arm so each side parses in isolation, then reconciles the
    /// two with [`ssa::merge_scopes`], rejecting a name defined on only one
    /// arm (`DivergentDefinition`).
    fn parse_if(&mut self) -> Result<()> {
        self.expect_str("(")?;
        let pred = self.parse_expr()?;
        self.expect_str(")")?;
        let ctrl = self.ctrl();
        let (_if_id, t, f) = self.graph.if_node(ctrl, pred);

        let pre_scope = self.scope.clone();

        self.set_ctrl(t);
        self.parse_statement(false)?;
        let then_scope = self.scope.clone();

        self.scope = pre_scope;
        self.set_ctrl(f);
        if self.lexer.matchx("else") {
            self.parse_statement(false)?;
        }
        let else_scope = self.scope.clone();

        let span = self.lexer.span_here();
        self.scope = ssa::merge_scopes(&mut self.graph, &self.reserved, &then_scope, &else_scope)
            .map_err(|name| ParseError::new(ParseErrorKind::DivergentDefinition(self.interner.resolve(name).to_string()), span))?;
        Ok(())
    }

    /// `'while' '(' expr ')' statement`: opens a loop region and
    /// loop-scope before the predicate is parsed (so the
    /// predicate's reads already see loop φs), clones the post-predicate
    /// scope as the exit scope, parses the body, folds in any `continue`
    /// jump, finalizes the loop's back-edge, and merges in any `break`
    /// jump to produce the scope in effect after the loop.
    fn parse_while(&mut self) -> Result<()> {
        self.expect_str("(")?;

        let entry_ctrl = self.ctrl();
        let head_scope = self.scope.clone();
        let loop_ctx = LoopCtx::open(&mut self.graph, entry_ctrl, &head_scope);
        let region = loop_ctx.region;
        self.set_ctrl(region);

        let entry_depth = self.scope.depth();
        self.loops.push(LoopFrame { ctx: loop_ctx, entry_depth, break_scope: None, continue_scope: None });

        let pred = self.parse_expr()?;
        self.expect_str(")")?;

        let ctrl_at_pred = self.ctrl();
        let (_if_id, t, f) = self.graph.if_node(ctrl_at_pred, pred);

        let mut exit_scope = self.scope.clone();
        exit_scope.update(self.reserved.ctrl, f);

        self.set_ctrl(t);
        self.parse_statement(false)?;

        let continue_scope = self.loops.last_mut().expect("the frame this call pushed is still on top").continue_scope.take();
        if let Some(continue_scope) = continue_scope {
            let span = self.lexer.span_here();
            self.scope = ssa::merge_scopes(&mut self.graph, &self.reserved, &self.scope, &continue_scope)
                .map_err(|name| ParseError::new(ParseErrorKind::DivergentDefinition(self.interner.resolve(name).to_string()), span))?;
        }

        let body_ctrl = self.ctrl();
        let LoopFrame { ctx: loop_ctx, break_scope, .. } =
            self.loops.pop().expect("the frame this call pushed is still on top");
        loop_ctx.close(&mut self.graph, &mut self.scope, &mut exit_scope, body_ctrl);

        let mut final_exit = exit_scope;
        if let Some(brk) = break_scope {
            let span = self.lexer.span_here();
            final_exit = ssa::merge_scopes(&mut self.graph, &self.reserved, &final_exit, &brk)
                .map_err(|name| ParseError::new(ParseErrorKind::DivergentDefinition(self.interner.resolve(name).to_string()), span))?;
        }
        self.scope = final_exit;
        Ok(())
    }

    /// `'break' ';'` / `'continue' ';'`: clones the current scope, kills
    /// its local control, prunes it down to the depth the
    /// enclosing loop opened at, and either becomes that jump kind's
    /// target scope (first jump of its kind) or merges into the existing
    /// one (subsequent jumps).
    fn parse_jump(&mut self, is_break: bool) -> Result<()> {
        if self.loops.is_empty() {
            let kw = if is_break { "break" } else { "continue" };
            let err = self.err(ParseErrorKind::LoopControlOutsideLoop(kw));
            return Err(err);
        }
        self.expect_str(";")?;

        let entry_depth = self.loops.last().expect("checked non-empty above").entry_depth;
        // Clone while `$ctrl` still holds the live control active at the
        // jump — that's the edge this break/continue actually contributes
        // to the eventual merge at the loop exit/back-edge. Only the
        // *original* scope's control dies here; the clone carries the jump
        // forward.
        let mut jump_scope = self.scope.clone();
        jump_scope.truncate_to_depth(entry_depth);
        self.kill_ctrl();

        let existing = if is_break {
            self.loops.last_mut().expect("checked non-empty above").break_scope.take()
        } else {
            self.loops.last_mut().expect("checked non-empty above").continue_scope.take()
        };
        let merged = match existing {
            None => jump_scope,
            Some(prev) => {
                let span = self.lexer.span_here();
                ssa::merge_scopes(&mut self.graph, &self.reserved, &prev, &jump_scope).map_err(|name| {
                    ParseError::new(ParseErrorKind::DivergentDefinition(self.interner.resolve(name).to_string()), span)
                })?
            }
        };
        if is_break {
            self.loops.last_mut().expect("checked non-empty above").break_scope = Some(merged);
        } else {
            self.loops.last_mut().expect("checked non-empty above").continue_scope = Some(merged);
        }
        Ok(())
    }
}
