//! Expression grammar: `expr := cmp`, down through `add`, `mul`, `unary`,
//! `postfix`, `primary`.

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ir::{BinOpKind, NodeId};
use crate::memory;
use crate::parser::Parser;
use crate::ty::Ty;
use simple_base::{Span, Symbol};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<NodeId> {
        self.parse_cmp()
    }

    /// `cmp := add ( ('==' | '!=' | '<=' | '<' | '>=' | '>') add )*`
    ///
    /// `a > b` / `a >= b` are represented by swapping operands of `<` /
    /// `<=`; `!=` is `==` followed by a logical not. Left-associative.
    fn parse_cmp(&mut self) -> Result<NodeId> {
        let mut lhs = self.parse_add()?;
        loop {
            if self.lexer.match_str("==") {
                let rhs = self.parse_add()?;
                lhs = self.graph.bin_op(BinOpKind::Eq, lhs, rhs);
            } else if self.lexer.match_str("!=") {
                let rhs = self.parse_add()?;
                let eq = self.graph.bin_op(BinOpKind::Eq, lhs, rhs);
                lhs = self.graph.not(eq);
            } else if self.lexer.match_str("<=") {
                let rhs = self.parse_add()?;
                lhs = self.graph.bin_op(BinOpKind::Le, lhs, rhs);
            } else if self.lexer.match_str(">=") {
                // a >= b  ==  b <= a
                let rhs = self.parse_add()?;
                lhs = self.graph.bin_op(BinOpKind::Le, rhs, lhs);
            } else if self.lexer.match_str("<") {
                let rhs = self.parse_add()?;
                lhs = self.graph.bin_op(BinOpKind::Lt, lhs, rhs);
            } else if self.lexer.match_str(">") {
                // a > b  ==  b < a
                let rhs = self.parse_add()?;
                lhs = self.graph.bin_op(BinOpKind::Lt, rhs, lhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    /// `add := mul ( ('+' | '-') mul )*`
    fn parse_add(&mut self) -> Result<NodeId> {
        let mut lhs = self.parse_mul()?;
        loop {
            if self.lexer.match_str("+") {
                let rhs = self.parse_mul()?;
                lhs = self.graph.bin_op(BinOpKind::Add, lhs, rhs);
            } else if self.lexer.match_str("-") {
                let rhs = self.parse_mul()?;
                lhs = self.graph.bin_op(BinOpKind::Sub, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    /// `mul := unary ( ('*' | '/') unary )*`
    fn parse_mul(&mut self) -> Result<NodeId> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.lexer.match_str("*") {
                let rhs = self.parse_unary()?;
                lhs = self.graph.bin_op(BinOpKind::Mul, lhs, rhs);
            } else if self.lexer.match_str("/") {
                let rhs = self.parse_unary()?;
                lhs = self.graph.bin_op(BinOpKind::Div, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    /// `unary := '-' unary | postfix`
    fn parse_unary(&mut self) -> Result<NodeId> {
        if self.lexer.match_str("-") {
            let zero = self.graph.con(Ty::int_const(0));
            let inner = self.parse_unary()?;
            Ok(self.graph.bin_op(BinOpKind::Sub, zero, inner))
        } else {
            self.parse_postfix()
        }
    }

    /// `postfix := primary ( '.' id )*` — but only a single `.field` is
    /// actually supported; a second `.` fails with
    /// `expected reference to a struct` because the intermediate load
    /// already produced a plain value.
    fn parse_postfix(&mut self) -> Result<NodeId> {
        let mut value = self.parse_primary()?;
        let mut is_struct_ptr = self.graph.ty(value).struct_id().is_some();
        while self.lexer.match_str(".") {
            if !is_struct_ptr {
                let span = self.lexer.span_here();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedToken { expected: "reference to a struct", found: "a plain value".into() },
                    span,
                ));
            }
            let (field_name, field_span) = self.require_id()?;
            value = self.load_field(value, field_name, field_span)?;
            is_struct_ptr = false;
        }
        Ok(value)
    }

    /// `primary := number | '(' expr ')' | 'true' | 'false' | 'null' | 'new' id | id`
    fn parse_primary(&mut self) -> Result<NodeId> {
        if self.lexer.is_number() {
            let (value, _) = self.lexer.parse_number().map_err(|kind| self.err(kind))?;
            return Ok(self.graph.con(Ty::int_const(value)));
        }
        if self.lexer.match_str("(") {
            let inner = self.parse_expr()?;
            self.expect_str(")")?;
            return Ok(inner);
        }
        if self.lexer.matchx("true") {
            return Ok(self.graph.con(Ty::bool_const(true)));
        }
        if self.lexer.matchx("false") {
            return Ok(self.graph.con(Ty::bool_const(false)));
        }
        if self.lexer.matchx("null") {
            return Ok(self.graph.con(Ty::untyped_null()));
        }
        if self.lexer.matchx("new") {
            let (name, span) = self.require_id()?;
            let sid = self
                .structs
                .lookup_by_name(name)
                .ok_or_else(|| ParseError::new(ParseErrorKind::UnknownStruct(self.interner.resolve(name).to_string()), span))?;
            return Ok(self.new_struct_instance(sid));
        }
        let (name, span) = self.require_id()?;
        self.resolve(name)
            .ok_or_else(|| ParseError::new(ParseErrorKind::UndefinedName(self.interner.resolve(name).to_string()), span))
    }

    /// `new T`: allocates a new, non-null instance, then stores a zero
    /// through every field's alias so every field starts at a known value.
    fn new_struct_instance(&mut self, sid: crate::structs::StructId) -> NodeId {
        let ptr = self.graph.new_struct(sid);
        let zero = self.graph.con(Ty::int_const(0));
        let fields: Vec<_> = self.structs.get(sid).fields.iter().map(|f| f.field_id).collect();
        for field_id in fields {
            let alias = memory::alias_name(&mut self.interner, field_id);
            let mem = self.resolve(alias).expect("every field alias is bound when its struct is declared");
            let next_mem = self.graph.store(mem, ptr, zero, field_id);
            self.rebind(alias, next_mem);
        }
        ptr
    }

    /// Loads `ptr.field_name`, resolving the field against `ptr`'s struct
    /// type. Fatal if `ptr` has no struct type at all (null-dereference)
    /// or the struct has no such field.
    fn load_field(&mut self, ptr: NodeId, field_name: Symbol, span: Span) -> Result<NodeId> {
        let ty = self.graph.ty(ptr);
        let Some(sid) = ty.struct_id() else {
            return Err(ParseError::new(ParseErrorKind::NullDereference, span));
        };
        let struct_name = self.interner.resolve(self.structs.get(sid).name).to_string();
        let field = self
            .structs
            .get(sid)
            .field(field_name)
            .map(|f| f.field_id)
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::UnknownField { struct_name: struct_name.clone(), field: self.interner.resolve(field_name).to_string() },
                    span,
                )
            })?;
        let alias = memory::alias_name(&mut self.interner, field);
        let mem = self.resolve(alias).expect("every field alias is bound when its struct is declared");
        Ok(self.graph.load(mem, ptr, field, Ty::IntBot))
    }

    /// Stores `value` into `ptr.field_name`, rewriting the field's memory
    /// alias to the new store. Used by `exprStmt`'s `x.f = e` form.
    pub(crate) fn store_field(&mut self, ptr: NodeId, field_name: Symbol, span: Span, value: NodeId) -> Result<()> {
        let ty = self.graph.ty(ptr);
        let Some(sid) = ty.struct_id() else {
            return Err(ParseError::new(ParseErrorKind::NullDereference, span));
        };
        let struct_name = self.interner.resolve(self.structs.get(sid).name).to_string();
        let field = self
            .structs
            .get(sid)
            .field(field_name)
            .map(|f| f.field_id)
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::UnknownField { struct_name: struct_name.clone(), field: self.interner.resolve(field_name).to_string() },
                    span,
                )
            })?;
        let alias = memory::alias_name(&mut self.interner, field);
        let mem = self.resolve(alias).expect("every field alias is bound when its struct is declared");
        let next_mem = self.graph.store(mem, ptr, value, field);
        self.rebind(alias, next_mem);
        Ok(())
    }
}
