//! String, ID, and resource-name helpers used across the read and write
//! layers.

use rand::Rng;
use regex::Regex;

/// Components of a legacy glossary URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryCoordinates {
    pub project: String,
    pub location_id: String,
    pub entry_group_id: String,
    pub glossary_id: String,
}

/// Components of a legacy entry URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCoordinates {
    pub project: String,
    pub location_id: String,
    pub entry_group_id: String,
    pub entry_id: String,
}

/// Components of a legacy entry resource name.
///
/// `project_location` keeps the `projects/{p}/locations/{l}` prefix intact
/// because that is the shape the lookup-entry URL needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryParts {
    pub project_location: String,
    pub entry_group_id: String,
    pub entry_id: String,
}

/// Strips leading and trailing whitespace from a display name.
pub fn trim_spaces_in_display_name(display_name: &str) -> &str {
    display_name.trim()
}

/// Converts a string to a valid Dataplex id: lowercase letters, digits and
/// hyphens, starting with a letter.
///
/// ## Examples
///
/// ```
/// use glossary_migrate::utils::normalize_id;
///
/// assert_eq!(normalize_id("My Glossary!"), "my-glossary");
/// assert_eq!(normalize_id("9abc"), "g9abc");
/// ```
pub fn normalize_id(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let collapsed = Regex::new(r"[^a-z0-9]+").unwrap();
    let normalized = collapsed
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string();
    match normalized.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => normalized,
        _ => format!("g{normalized}"),
    }
}

/// Extracts glossary coordinates from a Data Catalog glossary URL.
///
/// Returns `None` when the URL does not contain the
/// `projects/.../locations/.../entryGroups/.../glossaries/...` pattern.
pub fn parse_glossary_url(url: &str) -> Option<GlossaryCoordinates> {
    let pattern = Regex::new(
        r"projects/(?P<project>[^/]+)/locations/(?P<location_id>[^/]+)/entryGroups/(?P<entry_group_id>[^/]+)/glossaries/(?P<glossary_id>[^/?#]+)",
    )
    .unwrap();
    let captures = pattern.captures(url)?;
    Some(GlossaryCoordinates {
        project: captures["project"].to_string(),
        location_id: captures["location_id"].to_string(),
        entry_group_id: captures["entry_group_id"].to_string(),
        glossary_id: captures["glossary_id"].to_string(),
    })
}

/// Extracts entry coordinates from a Data Catalog entry URL.
///
/// Returns `None` when the URL does not contain the
/// `projects/.../locations/.../entryGroups/.../entries/...` pattern.
pub fn parse_entry_url(url: &str) -> Option<EntryCoordinates> {
    let pattern = Regex::new(
        r"projects/(?P<project>[^/]+)/locations/(?P<location_id>[^/]+)/entryGroups/(?P<entry_group_id>[^/]+)/entries/(?P<entry_id>[^/?#]+)",
    )
    .unwrap();
    let captures = pattern.captures(url)?;
    Some(EntryCoordinates {
        project: captures["project"].to_string(),
        location_id: captures["location_id"].to_string(),
        entry_group_id: captures["entry_group_id"].to_string(),
        entry_id: captures["entry_id"].to_string(),
    })
}

/// Extracts the trailing entry id from a Data Catalog resource name.
///
/// `projects/x/locations/y/entryGroups/z/entries/ENTRYID` → `ENTRYID`;
/// empty string when the name does not end in an `entries/` segment.
pub fn get_dc_glossary_taxonomy_id(glossary_taxonomy_name: &str) -> String {
    let pattern = Regex::new(r"entries/([^/]+)$").unwrap();
    pattern
        .captures(glossary_taxonomy_name)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Splits an entry resource name into its lookup-relevant parts.
///
/// Returns `None` when the fixed
/// `projects/{p}/locations/{l}/entryGroups/{g}/entries/{id}` grammar does
/// not match anywhere in the input.
pub fn extract_entry_parts(entry_full_name: &str) -> Option<EntryParts> {
    let pattern = Regex::new(
        r"(projects/[^/]+/locations/[^/]+)/entryGroups/([^/]+)/entries/([^/]+)",
    )
    .unwrap();
    let captures = pattern.captures(entry_full_name)?;
    Some(EntryParts {
        project_location: captures[1].to_string(),
        entry_group_id: captures[2].to_string(),
        entry_id: captures[3].to_string(),
    })
}

/// Removes the leading slashes from a search result's `linkedResource`.
pub fn normalize_linked_resource(linked_resource: &str) -> &str {
    linked_resource.trim_start_matches('/')
}

/// Extracts the first `projects/{x}/` segment value from a resource name,
/// or empty string when absent.
pub fn extract_project_number(glossary_resource_name: &str) -> String {
    let pattern = Regex::new(r"projects/([^/]+)/").unwrap();
    pattern
        .captures(glossary_resource_name)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Rewrites the first `projects/...` segment of `glossary_resource_name`
/// with the project number taken from the second argument.
pub fn build_destination_entry_name_with_project_number(
    glossary_resource_name: &str,
    glossary_resource_name_with_project_number: &str,
) -> String {
    let destination_project_number =
        extract_project_number(glossary_resource_name_with_project_number);
    let pattern = Regex::new(r"projects/[^/]+/").unwrap();
    pattern
        .replace(
            glossary_resource_name,
            format!("projects/{destination_project_number}/").as_str(),
        )
        .to_string()
}

/// Generates a unique entry-link id: a lowercase letter followed by 32 hex
/// characters.
pub fn generate_entry_link_id() -> String {
    format!("g{}", random_hex(32))
}

/// Normalizes a metadata-job prefix: lowercase letters, digits and hyphens
/// only, no leading/trailing hyphen, at most 50 characters.
pub fn normalize_job_id(job_prefix: &str) -> String {
    let pattern = Regex::new(r"[^a-z0-9-]").unwrap();
    let mut normalized = pattern
        .replace_all(&job_prefix.to_lowercase(), "-")
        .trim_matches('-')
        .to_string();
    normalized.truncate(50);
    normalized
}

/// Builds a unique job id from a prefix: `{normalized}-{8 hex chars}`.
pub fn generate_job_id(job_prefix: &str) -> String {
    format!("{}-{}", normalize_job_id(job_prefix), random_hex(8))
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap())
        .collect()
}
