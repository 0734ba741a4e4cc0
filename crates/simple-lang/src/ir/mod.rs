//! The Sea-of-Nodes intermediate representation this front end builds
//! directly from the token stream, with no AST in between.

pub mod graph;
pub mod node;

pub use graph::Graph;
pub use node::{BinOpKind, Node, NodeId, Operand};
