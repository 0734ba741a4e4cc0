//! # simple-base
//!
//! Pure structural atoms shared by the Simple front end:
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`Span`] — source location tracking
//!
//! # Design Principles
//!
//! This crate has no knowledge of Simple's grammar, its scope rules, or its
//! IR. It provides only generic, reusable infrastructure that `simple-lang`
//! builds upon.
//!
//! # Example
//!
//! ```
//! use simple_base::{Interner, Span};
//!
//! let mut interner = Interner::new();
//! let hello = interner.intern("hello");
//! let span = Span::new(0, 5);
//! assert_eq!(interner.resolve(hello), "hello");
//! assert_eq!(span.len(), 5);
//! ```

pub mod intern;
pub mod span;

pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
