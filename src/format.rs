//! Metadata format registry
//!
//! Each published format contributes a root element, its namespace
//! declarations, and the element aliases offered to the field-mapping
//! configuration. Formats are registered in a [`FormatRegistry`] built
//! at startup and resolved through a [`FormatCache`] scoped to one
//! render call.

use indexmap::IndexMap;

use crate::error::AssembleError;

/// OAI Dublin Core schema location.
pub const OAI_DC_SCHEMA: &str = "http://www.openarchives.org/OAI/2.0/oai_dc.xsd";

/// OAI Dublin Core XML namespace.
pub const OAI_DC_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";

/// Unqualified Dublin Core element namespace.
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// MODS v3 schema location.
pub const MODS_SCHEMA: &str = "http://www.loc.gov/standards/mods/v3/mods-3-6.xsd";

/// MODS XML namespace.
pub const MODS_NAMESPACE: &str = "http://www.loc.gov/mods/v3";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A published metadata format: root element, namespaces, and the
/// element set offered for field mapping.
pub trait MetadataFormat {
    /// Format identifier, also the protocol-level metadata prefix.
    fn id(&self) -> &str;

    /// Human-readable name for configuration surfaces.
    fn label(&self) -> &str;

    /// URL of the format's XML schema.
    fn schema_url(&self) -> &str;

    /// Namespace URI of the format's root element.
    fn namespace_uri(&self) -> &str;

    /// Tag name of the per-record root element.
    fn root_tag(&self) -> &str;

    /// Attributes placed on the root element (namespace declarations
    /// and schema location).
    fn root_attributes(&self) -> IndexMap<String, String>;

    /// Element aliases this format accepts, mapped to display labels.
    fn element_options(&self) -> IndexMap<String, String>;
}

/// OAI Dublin Core, the format every repository must publish.
pub struct OaiDc;

impl MetadataFormat for OaiDc {
    fn id(&self) -> &str {
        "oai_dc"
    }

    fn label(&self) -> &str {
        "OAI Dublin Core"
    }

    fn schema_url(&self) -> &str {
        OAI_DC_SCHEMA
    }

    fn namespace_uri(&self) -> &str {
        OAI_DC_NAMESPACE
    }

    fn root_tag(&self) -> &str {
        "oai_dc:dc"
    }

    fn root_attributes(&self) -> IndexMap<String, String> {
        [
            ("xmlns:oai_dc", OAI_DC_NAMESPACE),
            ("xmlns:dc", DC_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            (
                "xsi:schemaLocation",
                "http://www.openarchives.org/OAI/2.0/oai_dc/ http://www.openarchives.org/OAI/2.0/oai_dc.xsd",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn element_options(&self) -> IndexMap<String, String> {
        let mut options = IndexMap::new();
        for element in [
            "title",
            "creator",
            "subject",
            "description",
            "publisher",
            "contributor",
            "date",
            "type",
            "format",
            "identifier",
            "source",
            "language",
            "relation",
            "coverage",
            "rights",
        ] {
            let mut label = element.to_string();
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            options.insert(format!("dc:{element}"), label.clone());
            options.insert(
                format!("dc:{element}#xml:lang"),
                format!("{label} (language attribute)"),
            );
        }
        options
    }
}

/// MODS v3. Element options use the path-shaped aliases MODS mappings
/// are conventionally labeled with; the transform treats each alias as
/// one flat tag.
pub struct Mods;

impl MetadataFormat for Mods {
    fn id(&self) -> &str {
        "mods"
    }

    fn label(&self) -> &str {
        "MODS"
    }

    fn schema_url(&self) -> &str {
        MODS_SCHEMA
    }

    fn namespace_uri(&self) -> &str {
        MODS_NAMESPACE
    }

    fn root_tag(&self) -> &str {
        "mods"
    }

    fn root_attributes(&self) -> IndexMap<String, String> {
        [
            ("xmlns", MODS_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            (
                "xsi:schemaLocation",
                "http://www.loc.gov/mods/v3 http://www.loc.gov/standards/mods/v3/mods-3-6.xsd",
            ),
            ("version", "3.6"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn element_options(&self) -> IndexMap<String, String> {
        [
            ("titleInfo>title", "Title"),
            ("titleInfo>subTitle", "Subtitle"),
            ("name>namePart", "Name"),
            ("name>role>roleTerm", "Name role"),
            ("typeOfResource", "Type of resource"),
            ("genre", "Genre"),
            ("originInfo>dateIssued", "Date issued"),
            ("originInfo>publisher", "Publisher"),
            ("originInfo>place>placeTerm", "Place of publication"),
            ("language>languageTerm", "Language"),
            ("physicalDescription>form", "Form"),
            ("physicalDescription>extent", "Extent"),
            ("abstract", "Abstract"),
            ("note", "Note"),
            ("note#type", "Note type"),
            ("subject>topic", "Subject topic"),
            ("subject>geographic", "Subject geographic"),
            ("identifier", "Identifier"),
            ("identifier#type", "Identifier type"),
            ("location>url", "Location URL"),
            ("accessCondition", "Access condition"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
}

/// A format resolved to the plain values the assembler consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub id: String,
    pub root_tag: String,
    pub root_attributes: IndexMap<String, String>,
    pub schema_url: String,
    pub namespace_uri: String,
}

impl FormatDescriptor {
    fn from_format(format: &dyn MetadataFormat) -> Self {
        FormatDescriptor {
            id: format.id().to_string(),
            root_tag: format.root_tag().to_string(),
            root_attributes: format.root_attributes(),
            schema_url: format.schema_url().to_string(),
            namespace_uri: format.namespace_uri().to_string(),
        }
    }
}

/// Registration table of available formats, built once at startup.
#[derive(Default)]
pub struct FormatRegistry {
    formats: IndexMap<String, Box<dyn MetadataFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(OaiDc));
        registry.register(Box::new(Mods));
        registry
    }

    /// Register a format under its own id. A later registration with
    /// the same id replaces the earlier one.
    pub fn register(&mut self, format: Box<dyn MetadataFormat>) {
        self.formats.insert(format.id().to_string(), format);
    }

    pub fn get(&self, id: &str) -> Option<&dyn MetadataFormat> {
        self.formats.get(id).map(|format| &**format)
    }

    /// Registered format ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

/// Cache of resolved descriptors for one render call.
///
/// Passed explicitly into the assembler and discarded with it; not a
/// process-wide singleton.
#[derive(Default)]
pub struct FormatCache {
    resolved: IndexMap<String, FormatDescriptor>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a format id to its descriptor, consulting the registry
    /// only on first use.
    pub fn resolve(
        &mut self,
        registry: &FormatRegistry,
        id: &str,
    ) -> Result<&FormatDescriptor, AssembleError> {
        if !self.resolved.contains_key(id) {
            let format = registry.get(id).ok_or_else(|| AssembleError::MissingFormat {
                format_id: id.to_string(),
            })?;
            self.resolved
                .insert(id.to_string(), FormatDescriptor::from_format(format));
        }

        Ok(&self.resolved[id])
    }
}
