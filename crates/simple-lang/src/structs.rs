//! The struct-type registry.
//!
//! Struct declarations are collected into a registry keyed by name so that
//! a later `new StructName` or `StructName varName` can resolve the type by
//! a single lookup, and each field gets a stable, monotonically-increasing
//! alias id used by the memory-SSA sub-scope ([`crate::memory`]).

use simple_base::Symbol;
use std::collections::HashMap;

/// Identifies a struct type within one [`StructRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(u32);

impl StructId {
    pub fn new(index: u32) -> Self {
        StructId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Identifies one field of one struct type. Doubles as the lookup key for
/// the field's memory-alias pseudo-variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u32);

impl FieldId {
    pub fn new(index: u32) -> Self {
        FieldId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Symbol,
    pub field_id: FieldId,
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: Symbol,
    pub id: StructId,
    pub fields: Vec<Field>,
}

impl StructType {
    pub fn field(&self, name: Symbol) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All struct types declared so far in one compilation, plus the
/// monotonic counter that hands out globally-unique field ids (the alias
/// ids the memory-SSA sub-scope rides on).
#[derive(Debug, Default)]
pub struct StructRegistry {
    by_name: HashMap<Symbol, StructId>,
    types: Vec<StructType>,
    next_field_id: u32,
}

impl StructRegistry {
    pub fn new() -> Self {
        StructRegistry::default()
    }

    /// Declares a new struct type. `fields` is the ordered list of field
    /// names; each gets a fresh, globally-unique [`FieldId`] regardless of
    /// which struct declares it, so that two different structs never
    /// collide on the same memory-alias slot.
    pub fn declare(&mut self, name: Symbol, field_names: &[Symbol]) -> StructId {
        let id = StructId::new(self.types.len() as u32);
        let fields = field_names
            .iter()
            .map(|&name| {
                let field_id = FieldId(self.next_field_id);
                self.next_field_id += 1;
                Field { name, field_id }
            })
            .collect();
        self.types.push(StructType { name, id, fields });
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup_by_name(&self, name: Symbol) -> Option<StructId> {
        self.by_name.get(&name).copied()
    }

    pub fn get(&self, id: StructId) -> &StructType {
        &self.types[id.index() as usize]
    }

    pub fn field_count(&self) -> usize {
        self.next_field_id as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_base::Interner;

    #[test]
    fn fields_get_distinct_global_ids() {
        let mut interner = Interner::new();
        let mut reg = StructRegistry::new();
        let a = interner.intern("A");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let b = interner.intern("B");

        let a_id = reg.declare(a, &[x, y]);
        let b_id = reg.declare(b, &[x]);

        let a_ty = reg.get(a_id);
        let b_ty = reg.get(b_id);
        assert_ne!(a_ty.field(x).unwrap().field_id, b_ty.field(x).unwrap().field_id);
        assert_eq!(reg.field_count(), 3);
    }

    #[test]
    fn lookup_by_name_round_trips() {
        let mut interner = Interner::new();
        let mut reg = StructRegistry::new();
        let name = interner.intern("Node");
        let id = reg.declare(name, &[]);
        assert_eq!(reg.lookup_by_name(name), Some(id));
    }
}
