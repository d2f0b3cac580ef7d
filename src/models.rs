//! Typed records produced by the read layer.
//!
//! All of these are request-scoped: they are built from one API invocation
//! and none persist beyond a single run of the migration.

/// Description and contacts carried in a legacy entry's business context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreAspects {
    pub description: String,
    pub contacts: Vec<String>,
}

/// A legacy glossary term or category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlossaryTaxonomyEntry {
    /// Fully-qualified resource name.
    pub name: String,
    /// `"TERM"` or `"CATEGORY"`.
    pub entry_type: String,
    pub uid: String,
    pub display_name: String,
    pub core_aspects: CoreAspects,
}

/// An association between two glossary entries (related-to, synonym-of, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlossaryTaxonomyRelationship {
    pub name: String,
    pub source_entry_name: String,
    pub destination_entry_name: String,
    pub relationship_type: String,
    /// Destination's parent glossary entry, when the API exposed it.
    pub parent_glossary_entry_name: String,
}

/// A relationship between a glossary term and a non-glossary catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DcEntryRelationship {
    pub name: String,
    pub source_column: String,
    pub destination_entry_name: String,
    pub relationship_type: String,
}

/// One hit from a Data Catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchEntryResult {
    /// Full catalog resource path of the entry.
    pub relative_resource_name: String,
    /// Linked resource identifier, `//`-prefixed as the search API returns it.
    pub linked_resource: String,
}
