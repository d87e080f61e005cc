//! Error types.
//!
//! Every fallible operation in the crate returns [`Result`]. Callers that only
//! care about the broad category (retry, report, abort) can match on
//! [`Error::kind`] instead of the individual variants.

use thiserror::Error;

use crate::ecs::EntityHandle;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An entity that already carries a handle was registered again.
    DoubleRegistration,
    /// A handle has no entry where the operation defines no default.
    NotFound,
    /// The caller passed a value the operation cannot accept. Nothing was mutated.
    InvalidArgument,
    /// Hierarchy links are malformed. The affected propagation was aborted.
    StructuralInconsistency,
    /// JSON input could not be decoded.
    Decode,
    /// The handle space ran out. No further entities can be registered.
    Exhausted,
}

/// Errors produced by the entity, transform and tile-map systems.
#[derive(Error, Debug)]
pub enum Error {
    #[error("entity is already registered with handle {0}")]
    DoubleRegistration(EntityHandle),

    #[error("no entry for handle {0}")]
    NotFound(EntityHandle),

    #[error("the sentinel handle cannot own components")]
    SentinelHandle,

    #[error("invalid transform space value {0}")]
    InvalidSpace(u32),

    #[error("unknown transform space `{0}`")]
    UnknownSpace(String),

    #[error("no tileset covers global tile id {0}")]
    NoTileset(u32),

    #[error("cannot parent {child} to {parent}: {parent} is already its descendant")]
    ParentCycle {
        child: EntityHandle,
        parent: EntityHandle,
    },

    #[error("invalid map data: {0}")]
    InvalidMap(String),

    #[error("{from} links to {to}, which has no transform instance")]
    DanglingLink { from: EntityHandle, to: EntityHandle },

    #[error("hierarchy under {root} reaches {entity} twice")]
    HierarchyCycle {
        root: EntityHandle,
        entity: EntityHandle,
    },

    #[error("hierarchy under {root} is deeper than {depth} levels")]
    DepthExceeded { root: EntityHandle, depth: usize },

    #[error("cannot parent {child} to {parent}: the tree would nest deeper than {max_depth} levels")]
    NestingTooDeep {
        child: EntityHandle,
        parent: EntityHandle,
        max_depth: usize,
    },

    #[error("parent of {0} has a singular world transform")]
    SingularParent(EntityHandle),

    #[error("all entity handles have been allocated")]
    HandlesExhausted,

    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DoubleRegistration(_) => ErrorKind::DoubleRegistration,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::SentinelHandle
            | Error::InvalidSpace(_)
            | Error::UnknownSpace(_)
            | Error::NoTileset(_)
            | Error::ParentCycle { .. }
            | Error::InvalidMap(_)
            | Error::NestingTooDeep { .. }
            | Error::SingularParent(_) => ErrorKind::InvalidArgument,
            Error::DanglingLink { .. }
            | Error::HierarchyCycle { .. }
            | Error::DepthExceeded { .. } => ErrorKind::StructuralInconsistency,
            Error::Decode(_) => ErrorKind::Decode,
            Error::HandlesExhausted => ErrorKind::Exhausted,
        }
    }
}
