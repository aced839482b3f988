//! Command implementations for the loopfold CLI

pub mod check;
pub mod common;
pub mod convert;

pub use check::check_command;
pub use convert::convert_command;
