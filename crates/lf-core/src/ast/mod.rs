//! Syntax tree for the Java subset the converter reads and writes.
//!
//! The tree is deliberately small: one tagged variant per construct the
//! engine inspects, plus enough of the surrounding declarations to print a
//! statement back out.

mod expr;
mod ident;
mod item;
mod stmt;
mod ty;
pub mod visit;

pub use expr::*;
pub use ident::*;
pub use item::*;
pub use stmt::*;
pub use ty::*;
