// Queries - stateless lookups over loop bodies

pub mod control_flow;
pub mod mutation;
pub mod nullness;
pub mod usage;

pub use control_flow::*;
pub use mutation::*;
pub use nullness::*;
pub use usage::*;
