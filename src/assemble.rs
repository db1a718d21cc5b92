//! Record assembly pipeline
//!
//! Ties the pieces together for one render call: remap each row's field
//! ids to aliases, build per-row trees, consolidate rows by entity id,
//! and wrap each consolidated tree in a [`Document`] carrying the active
//! format's root element. A row that fails to transform is skipped with
//! a diagnostic; it never aborts the batch.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{AssembleError, Diagnostic};
use crate::format::{FormatCache, FormatDescriptor, FormatRegistry};
use crate::mapping::FieldMappings;
use crate::merge::consolidate;
use crate::transform::transform;
use crate::tree::{Document, SourceRow};

/// What one render call should produce: the format to render records in
/// and the formats advertised to the protocol layer.
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    /// Format the records are rendered in.
    pub format_id: String,
    /// Formats advertised in the descriptor listing. Ids without a
    /// registration are skipped with a diagnostic.
    pub enabled_formats: Vec<String>,
}

impl AssembleRequest {
    /// Render one format and advertise only it.
    pub fn single(format_id: impl Into<String>) -> Self {
        let format_id = format_id.into();
        AssembleRequest {
            enabled_formats: vec![format_id.clone()],
            format_id,
        }
    }
}

/// Output of one render call: per-entity documents, the advertised
/// format descriptors, and an accounting of everything skipped or
/// overridden on the way.
#[derive(Debug)]
pub struct AssembleResult {
    /// One document per entity, keyed by entity id in first-seen order.
    pub records: IndexMap<String, Document>,
    /// Descriptors for the advertised formats.
    pub formats: Vec<FormatDescriptor>,
    /// Recoverable conditions encountered during assembly.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: AssembleStats,
}

/// Counters for one render call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssembleStats {
    /// Rows received from the query.
    pub rows_in: usize,
    /// Rows folded into an existing entity's baseline.
    pub rows_merged: usize,
    /// Rows dropped because they could not be transformed.
    pub rows_skipped: usize,
    /// Entities with a produced document.
    pub entities_out: usize,
}

/// Assemble one document per entity from ordered query rows.
///
/// The requested format must be registered; everything else degrades to
/// diagnostics. The caller receives the partial output together with the
/// skip accounting.
pub fn assemble(
    rows: &[SourceRow],
    registry: &FormatRegistry,
    mappings: &FieldMappings,
    request: &AssembleRequest,
) -> Result<AssembleResult, AssembleError> {
    let mut cache = FormatCache::new();
    let descriptor = cache.resolve(registry, &request.format_id)?.clone();

    let mut diagnostics = Vec::new();
    let mut stats = AssembleStats {
        rows_in: rows.len(),
        ..AssembleStats::default()
    };

    let mut trees = Vec::with_capacity(rows.len());
    for row in rows {
        let aliased = mappings.apply(&request.format_id, &row.fields);
        match transform(&aliased) {
            Ok(tree) => {
                trees.push((row.id.clone(), tree));
            }
            Err(error) => {
                stats.rows_skipped += 1;
                let diagnostic = Diagnostic::SkippedRow {
                    entity_id: row.id.clone(),
                    reason: error.to_string(),
                };
                warn!(entity_id = %row.id, "{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }
    }

    let surviving_rows = trees.len();
    let consolidated = consolidate(trees, &mut diagnostics);
    stats.rows_merged = surviving_rows - consolidated.len();

    let mut records = IndexMap::new();
    for (entity_id, content) in consolidated {
        records.insert(
            entity_id,
            Document {
                root_tag: descriptor.root_tag.clone(),
                root_attributes: descriptor.root_attributes.clone(),
                content,
            },
        );
    }
    stats.entities_out = records.len();

    let mut formats = Vec::with_capacity(request.enabled_formats.len());
    for format_id in &request.enabled_formats {
        match cache.resolve(registry, format_id) {
            Ok(resolved) => formats.push(resolved.clone()),
            Err(_) => {
                let diagnostic = Diagnostic::MissingFormat {
                    format_id: format_id.clone(),
                };
                warn!(format_id = %format_id, "{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }
    }

    debug!(
        rows_in = stats.rows_in,
        rows_merged = stats.rows_merged,
        rows_skipped = stats.rows_skipped,
        entities_out = stats.entities_out,
        format = %request.format_id,
        "assembled records"
    );

    Ok(AssembleResult {
        records,
        formats,
        diagnostics,
        stats,
    })
}
