//! OAI-PMH Record Assembly Library
//!
//! This library assembles per-entity hierarchical metadata records from
//! flat, row-oriented query results, for publication under OAI-PMH.
//!
//! # Overview
//!
//! A query yields rows carrying an entity identifier and a flat mapping
//! of aliased field values; one entity may span several rows because of
//! multi-valued relations. Assembly proceeds by:
//!
//! 1. Remapping raw field ids to the active format's aliases
//! 2. Building each row into a nested document tree, honoring the
//!    `tag` / `tag#attr` alias grammar and repeated-element semantics
//! 3. Consolidating the trees sharing an entity id via a recursive
//!    diff-then-merge that never reintroduces an already-seen value
//! 4. Wrapping each consolidated tree with the format's root element
//!    and encoding it to XML
//!
//! The protocol surface (verbs, pagination, resumption tokens) is a
//! separate collaborator; this crate produces the per-entity documents
//! and the format descriptors that collaborator advertises.
//!
//! # Usage
//!
//! ```ignore
//! use oai_assemble::{
//!     assemble, encode_document, AssembleRequest, FieldMappings, FormatRegistry,
//! };
//!
//! let rows = // load query rows (entity id + aliased fields)
//! let registry = FormatRegistry::with_defaults();
//! let mappings = FieldMappings::new();
//!
//! let result = assemble(&rows, &registry, &mappings, &AssembleRequest::single("oai_dc"))?;
//! for (entity_id, document) in &result.records {
//!     println!("{entity_id}: {}", encode_document(document, true)?);
//! }
//! ```

pub mod alias;
pub mod assemble;
pub mod encode;
pub mod error;
pub mod format;
pub mod mapping;
pub mod merge;
pub mod transform;
pub mod tree;

// Re-export main types for convenience
pub use crate::assemble::{assemble, AssembleRequest, AssembleResult, AssembleStats};
pub use crate::encode::encode_document;
pub use crate::error::{AssembleError, Diagnostic};
pub use crate::format::{
    FormatCache, FormatDescriptor, FormatRegistry, MetadataFormat, Mods, OaiDc,
};
pub use crate::mapping::{FieldMappings, UNMAPPED_SENTINEL};
pub use crate::merge::consolidate;
pub use crate::transform::transform;
pub use crate::tree::{Document, FieldValue, Leaf, Node, NodeKind, NodeMap, RawRow, Row, SourceRow};
