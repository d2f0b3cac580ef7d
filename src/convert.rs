//! Converters from raw API pages into the typed models.
//!
//! Listing endpoints return loosely-shaped JSON; each converter deserializes
//! the fields it needs and defaults the rest, so a missing field never fails
//! a whole page.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{
    CoreAspects, DcEntryRelationship, GlossaryTaxonomyEntry, GlossaryTaxonomyRelationship,
    SearchEntryResult,
};
use crate::utils::build_destination_entry_name_with_project_number;

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawEntry {
    name: String,
    display_name: String,
    entry_type: String,
    entry_uid: String,
    core_aspects: RawCoreAspects,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawCoreAspects {
    business_context: RawBusinessContext,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawBusinessContext {
    json_content: RawBusinessContent,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawBusinessContent {
    description: String,
    contacts: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawRelationship {
    name: String,
    relationship_type: String,
    source_entry: RawEntryRef,
    destination_entry: Option<RawDestinationEntry>,
    destination_entry_name: String,
    source_column: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEntryRef {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawDestinationEntry {
    name: String,
    core_relationships: Vec<RawCoreRelationship>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawCoreRelationship {
    destination_entry_name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSearchResult {
    relative_resource_name: String,
    linked_resource: String,
}

/// Converts a page of raw glossary taxonomy entries.
pub fn convert_glossary_taxonomy_entries(dc_entries: &[Value]) -> Vec<GlossaryTaxonomyEntry> {
    dc_entries
        .iter()
        .map(|raw| {
            let entry: RawEntry = deserialize_or_default(raw);
            let content = entry.core_aspects.business_context.json_content;
            GlossaryTaxonomyEntry {
                name: entry.name,
                entry_type: entry.entry_type,
                uid: entry.entry_uid,
                display_name: entry.display_name,
                core_aspects: CoreAspects {
                    description: content.description,
                    contacts: content.contacts,
                },
            }
        })
        .collect()
}

/// Converts a page of raw glossary relationships.
///
/// Relationships whose destination entry is not visible to the caller (the
/// API returns only `destinationEntryName`) are skipped with a warning: the
/// caller lacks permission on the destination, so the link cannot be
/// migrated.
pub fn convert_glossary_taxonomy_relationships(
    dc_relationships: &[Value],
) -> Vec<GlossaryTaxonomyRelationship> {
    dc_relationships
        .iter()
        .map(deserialize_or_default::<RawRelationship>)
        .filter_map(|raw| {
            let destination_visible = raw
                .destination_entry
                .as_ref()
                .is_some_and(|d| !d.name.is_empty() || !d.core_relationships.is_empty());
            if !destination_visible && !raw.destination_entry_name.is_empty() {
                warn!(
                    "Skipping relationship '{}': the user does not have permission to view the destination entry.",
                    raw.name
                );
                return None;
            }
            Some(convert_relationship(raw))
        })
        .collect()
}

fn convert_relationship(raw: RawRelationship) -> GlossaryTaxonomyRelationship {
    let destination = raw.destination_entry.unwrap_or_default();
    let parent_glossary_entry_name = destination
        .core_relationships
        .first()
        .map(|r| r.destination_entry_name.clone())
        .unwrap_or_default();
    GlossaryTaxonomyRelationship {
        name: raw.name,
        source_entry_name: raw.source_entry.name,
        destination_entry_name: build_destination_entry_name_with_project_number(
            &destination.name,
            &raw.destination_entry_name,
        ),
        relationship_type: raw.relationship_type,
        parent_glossary_entry_name,
    }
}

/// Converts a page of raw catalog-entry relationships.
pub fn convert_entry_relationships(dc_relationships: &[Value]) -> Vec<DcEntryRelationship> {
    dc_relationships
        .iter()
        .map(|raw| {
            let relationship: RawRelationship = deserialize_or_default(raw);
            DcEntryRelationship {
                name: relationship.name,
                source_column: relationship.source_column,
                destination_entry_name: relationship.destination_entry_name,
                relationship_type: relationship.relationship_type,
            }
        })
        .collect()
}

/// Converts a page of raw search results.
pub fn convert_search_results(search_results: &[Value]) -> Vec<SearchEntryResult> {
    search_results
        .iter()
        .map(|raw| {
            let result: RawSearchResult = deserialize_or_default(raw);
            SearchEntryResult {
                relative_resource_name: result.relative_resource_name,
                linked_resource: result.linked_resource,
            }
        })
        .collect()
}

fn deserialize_or_default<T: Default + for<'de> Deserialize<'de>>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_conversion_reads_business_context() {
        let raw = vec![json!({
            "name": "projects/p/locations/us/entryGroups/eg/entries/t1",
            "displayName": "Revenue",
            "entryType": "TERM",
            "entryUid": "uid-1",
            "coreAspects": {
                "business_context": {
                    "jsonContent": {
                        "description": "Money in.",
                        "contacts": ["steward@example.com"]
                    }
                }
            }
        })];

        let entries = convert_glossary_taxonomy_entries(&raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "Revenue");
        assert_eq!(entries[0].entry_type, "TERM");
        assert_eq!(entries[0].core_aspects.description, "Money in.");
        assert_eq!(entries[0].core_aspects.contacts, vec!["steward@example.com"]);
    }

    #[test]
    fn entry_conversion_defaults_missing_fields() {
        let entries = convert_glossary_taxonomy_entries(&[json!({"name": "only-name"})]);
        assert_eq!(entries[0].name, "only-name");
        assert_eq!(entries[0].display_name, "");
        assert_eq!(entries[0].core_aspects, CoreAspects::default());
    }

    #[test]
    fn relationship_conversion_rewrites_destination_project() {
        let raw = vec![json!({
            "name": "projects/p/relationships/r1",
            "relationshipType": "is_related_to",
            "sourceEntry": {"name": "projects/p/locations/us/entryGroups/eg/entries/a"},
            "destinationEntry": {
                "name": "projects/my-proj/locations/us/entryGroups/eg/entries/b",
                "coreRelationships": [
                    {"destinationEntryName": "projects/123/locations/us/entryGroups/eg/entries/gloss"}
                ]
            },
            "destinationEntryName": "projects/987654/locations/us/entryGroups/eg/entries/b"
        })];

        let relationships = convert_glossary_taxonomy_relationships(&raw);
        assert_eq!(relationships.len(), 1);
        assert_eq!(
            relationships[0].destination_entry_name,
            "projects/987654/locations/us/entryGroups/eg/entries/b"
        );
        assert_eq!(
            relationships[0].parent_glossary_entry_name,
            "projects/123/locations/us/entryGroups/eg/entries/gloss"
        );
        assert_eq!(relationships[0].relationship_type, "is_related_to");
    }

    #[test]
    fn invisible_destination_is_skipped() {
        let raw = vec![json!({
            "name": "projects/p/relationships/hidden",
            "relationshipType": "is_synonymous_to",
            "sourceEntry": {"name": "projects/p/entries/a"},
            "destinationEntryName": "projects/987/entries/b"
        })];

        assert!(convert_glossary_taxonomy_relationships(&raw).is_empty());
    }

    #[test]
    fn entry_relationship_conversion_keeps_raw_destination() {
        let raw = vec![json!({
            "name": "projects/p/relationships/r2",
            "relationshipType": "is_described_by",
            "sourceColumn": "col_a",
            "destinationEntryName": "projects/p/entries/term"
        })];

        let relationships = convert_entry_relationships(&raw);
        assert_eq!(relationships[0].source_column, "col_a");
        assert_eq!(relationships[0].destination_entry_name, "projects/p/entries/term");
    }

    #[test]
    fn search_result_conversion() {
        let raw = vec![json!({
            "relativeResourceName": "projects/p/locations/us/entryGroups/eg/entries/e",
            "linkedResource": "//id-1"
        })];

        let results = convert_search_results(&raw);
        assert_eq!(results[0].linked_resource, "//id-1");
        assert_eq!(
            results[0].relative_resource_name,
            "projects/p/locations/us/entryGroups/eg/entries/e"
        );
    }
}
