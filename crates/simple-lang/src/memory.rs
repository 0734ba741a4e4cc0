//! Memory-alias pseudo-variables.
//!
//! A struct field's memory state rides on the ordinary scope mechanism
//! under a reserved `$alias{k}` name, rather than through any dedicated
//! memory-SSA data structure. That's the whole trick: because aliases are
//! ordinary scope entries, [`crate::ssa::merge_scopes`] and
//! [`crate::ssa::LoopCtx`] produce memory φs at if-merges and loop heads
//! automatically, with no special-casing here.

use crate::structs::FieldId;
use simple_base::{Interner, Symbol};

/// The reserved scope name for one field's memory alias. `$` cannot start
/// a Simple identifier, so this can never collide with user code.
pub fn alias_name(interner: &mut Interner, field: FieldId) -> Symbol {
    interner.intern(&format!("$alias{}", field.index()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::StructRegistry;

    #[test]
    fn distinct_fields_get_distinct_alias_names() {
        let mut interner = Interner::new();
        let mut reg = StructRegistry::new();
        let s = interner.intern("S");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let id = reg.declare(s, &[x, y]);
        let ty = reg.get(id);
        let fx = ty.field(x).unwrap().field_id;
        let fy = ty.field(y).unwrap().field_id;
        assert_ne!(alias_name(&mut interner, fx), alias_name(&mut interner, fy));
    }
}
