//! Alias grammar for field destinations
//!
//! An alias names the destination of a field value in the output tree:
//! `tag` addresses an element, `tag#attr` addresses one attribute on
//! that element. A second, path-based grammar (`parent>child` segments)
//! exists in format element listings but is not consumed by the
//! transform; [`split_path`] parses it for callers that present those
//! listings.

use crate::error::AssembleError;

/// Separates the tag name from an attribute name in an alias.
pub const ATTRIBUTE_MARKER: char = '#';

/// Separates path segments in the dormant nesting grammar.
pub const PATH_SEPARATOR: char = '>';

/// A parsed alias: the destination tag and, for `tag#attr` aliases, the
/// attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlias<'a> {
    pub tag: &'a str,
    pub attr: Option<&'a str>,
}

/// Split an alias on the attribute marker.
///
/// Zero markers yield a tag-only alias, one marker yields tag plus
/// attribute name. More than one marker is malformed.
pub fn resolve(alias: &str) -> Result<ResolvedAlias<'_>, AssembleError> {
    let mut parts = alias.split(ATTRIBUTE_MARKER);

    let tag = parts.next().unwrap_or(alias);
    let attr = parts.next();

    if parts.next().is_some() {
        return Err(AssembleError::AliasSyntax {
            alias: alias.to_string(),
        });
    }

    Ok(ResolvedAlias { tag, attr })
}

/// Split an alias into its `>`-separated path segments.
///
/// A plain alias comes back as a single segment. The transform does not
/// follow paths into nested elements; this exists for format element
/// listings that use path-shaped aliases as labels.
pub fn split_path(alias: &str) -> Vec<&str> {
    alias.split(PATH_SEPARATOR).collect()
}
