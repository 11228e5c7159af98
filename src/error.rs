use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::plan::{Pos, Size};
use crate::templates::TemplateKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of a per-plan failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Schema,
    BlockNotAllowed,
    PropertyNotAllowed,
    ValueNotAllowed,
    PositionOutOfBounds,
    TemplateNotFound,
    JigsawInvalid,
    Io,
}

/// Allowlist violation for a single block state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("block {block_id} is not allowlisted")]
    BlockNotAllowed { block_id: String },

    #[error("property '{property}' is not allowlisted for block {block_id}")]
    PropertyNotAllowed { block_id: String, property: String },

    #[error("value '{value}' is not allowlisted for property {block_id}.{property}")]
    ValueNotAllowed {
        block_id: String,
        property: String,
        value: String,
    },
}

/// Failure of one plan. Never aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("malformed plan: {source}")]
    Parse { source: serde_json::Error },

    #[error("schema error: {message}")]
    Schema { message: String },

    #[error("{violation} at {pos}")]
    NotAllowed {
        pos: Pos,
        #[source]
        violation: ValidationError,
    },

    #[error("{what} at {pos} is outside size {size}")]
    PositionOutOfBounds {
        what: &'static str,
        pos: Pos,
        size: Size,
    },

    #[error("{kind} template '{name}' not found")]
    TemplateNotFound { kind: TemplateKind, name: String },

    #[error("invalid jigsaw: {message}")]
    JigsawInvalid { message: String },

    #[error("io error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl CompileError {
    pub fn schema(message: impl Into<String>) -> Self {
        CompileError::Schema {
            message: message.into(),
        }
    }

    pub fn jigsaw(message: impl Into<String>) -> Self {
        CompileError::JigsawInvalid {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Parse { .. } => ErrorKind::Parse,
            CompileError::Schema { .. } => ErrorKind::Schema,
            CompileError::NotAllowed { violation, .. } => match violation {
                ValidationError::BlockNotAllowed { .. } => ErrorKind::BlockNotAllowed,
                ValidationError::PropertyNotAllowed { .. } => ErrorKind::PropertyNotAllowed,
                ValidationError::ValueNotAllowed { .. } => ErrorKind::ValueNotAllowed,
            },
            CompileError::PositionOutOfBounds { .. } => ErrorKind::PositionOutOfBounds,
            CompileError::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
            CompileError::JigsawInvalid { .. } => ErrorKind::JigsawInvalid,
            CompileError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// A per-plan error annotated with where it happened.
#[derive(Debug)]
pub struct PlanFailure {
    pub plan: PathBuf,
    pub biome: Option<String>,
    pub error: CompileError,
}

impl fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.biome {
            Some(biome) => write!(f, "{} [{}]: {}", self.plan.display(), biome, self.error),
            None => write!(f, "{}: {}", self.plan.display(), self.error),
        }
    }
}

/// Run-level errors. Any of these stops the run before output is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("allowlist {}: {message}", path.display())]
    Allowlist { path: PathBuf, message: String },

    #[error("template {}: {message}", path.display())]
    Template { path: PathBuf, message: String },

    #[error("io error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("worker failed: {0}")]
    Worker(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
