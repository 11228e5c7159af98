//! Compiles JSON structure plans into gzip NBT structure templates.
//!
//! A run loads the allowlist and template library once, then compiles every
//! plan under the plan directory independently: validation, an optional
//! rotation and mirror, template splicing and palette construction. One
//! failing plan never stops the others.

pub mod allowlist;
pub mod batch;
pub mod cli;
pub mod compiler;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod orientation;
pub mod plan;
pub mod templates;

pub use allowlist::Allowlist;
pub use batch::{BatchConfig, BatchSummary};
pub use cli::Cli;
pub use compiler::{compile_plan, CompileContext, CompileOptions, CompiledStructure};
pub use error::{CompileError, Error, ErrorKind, PlanFailure, Result};
pub use orientation::{Mirror, Rotation};
pub use plan::{load_plan, parse_plan, Plan};
pub use templates::TemplateLibrary;
