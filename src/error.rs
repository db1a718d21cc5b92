//! Error and diagnostic types for record assembly

use thiserror::Error;

use crate::tree::NodeKind;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Invalid alias '{alias}': more than one attribute marker")]
    AliasSyntax { alias: String },

    #[error("No metadata format registered for id '{format_id}'")]
    MissingFormat { format_id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding error: {0}")]
    Xml(String),
}

/// A recoverable condition observed during assembly.
///
/// Diagnostics are collected into the assembly result alongside the
/// successful output, so no override or exclusion is silent. Each one is
/// also emitted as a `tracing` warning at the point it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Merge found incompatible node shapes at the same tag. The richer
    /// shape was kept, the other side discarded.
    ShapeConflict {
        entity_id: String,
        tag: String,
        kept: NodeKind,
        discarded: NodeKind,
    },
    /// A row could not be transformed and was skipped; the rest of the
    /// batch proceeded.
    SkippedRow { entity_id: String, reason: String },
    /// An enabled format id has no registered descriptor; no records were
    /// produced for it.
    MissingFormat { format_id: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::ShapeConflict {
                entity_id,
                tag,
                kept,
                discarded,
            } => write!(
                f,
                "shape conflict for entity '{entity_id}' at tag '{tag}': kept {kept}, discarded {discarded}"
            ),
            Diagnostic::SkippedRow { entity_id, reason } => {
                write!(f, "skipped row for entity '{entity_id}': {reason}")
            }
            Diagnostic::MissingFormat { format_id } => {
                write!(f, "no metadata format registered for id '{format_id}'")
            }
        }
    }
}
