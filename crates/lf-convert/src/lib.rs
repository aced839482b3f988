// lf-convert: loop to stream-pipeline conversion engine
//
// Architecture:
// - extract: classify one loop statement into a LoopModel
// - preconditions: safety rules that reject behavior-changing rewrites
// - builder: fold the loop body into pipeline operations and one terminal
// - render: print a pipeline back as replacement statements
// - engine: run the four stages for one loop
// - driver: walk a compilation unit bottom-up and collect text edits
// - queries: stateless name, control-flow and mutation lookups

pub mod builder;
pub mod driver;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod preconditions;
pub mod queries;
pub mod reduce;
pub mod render;

pub use driver::{convert_source, ConversionDriver, ConvertedSource, LoopOutcome, LoopVerdict, UnitReport};
pub use engine::{Conversion, LoopConverter, Rewrite};
pub use model::{LoopKind, LoopModel, LoopSite, SourceKind};
pub use preconditions::{PreconditionReport, Rejection, RejectionReason};
