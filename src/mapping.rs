//! Field-mapping configuration
//!
//! Maps raw query field ids to the aliases a metadata format expects.
//! Mappings are kept per format, so the same field can feed `dc:title`
//! in one format and `titleInfo>title` in another.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tree::{RawRow, Row};

/// Mapping value meaning "this field is not published in this format".
pub const UNMAPPED_SENTINEL: &str = "none";

/// Per-format tables of raw field id to target alias.
///
/// A field with no entry, an empty entry, or the `"none"` sentinel falls
/// back to using its raw id as the alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMappings {
    by_format: IndexMap<String, IndexMap<String, String>>,
}

impl FieldMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target alias for one field in one format.
    pub fn set(
        &mut self,
        format_id: impl Into<String>,
        field_id: impl Into<String>,
        alias: impl Into<String>,
    ) {
        self.by_format
            .entry(format_id.into())
            .or_default()
            .insert(field_id.into(), alias.into());
    }

    /// The alias a field publishes under in the given format.
    pub fn alias_for<'a>(&'a self, format_id: &str, field_id: &'a str) -> &'a str {
        match self
            .by_format
            .get(format_id)
            .and_then(|fields| fields.get(field_id))
        {
            Some(alias) if !alias.is_empty() && alias != UNMAPPED_SENTINEL => alias,
            _ => field_id,
        }
    }

    /// Remap a raw row's field ids to aliases, preserving field order.
    pub fn apply(&self, format_id: &str, raw: &RawRow) -> Row {
        raw.iter()
            .map(|(field_id, value)| {
                (
                    self.alias_for(format_id, field_id).to_string(),
                    value.clone(),
                )
            })
            .collect()
    }
}
