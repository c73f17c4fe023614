//! The `sidebar-items.js` file of each documented crate (or module).
//!
//! ```text
//! initSidebarItems({"fn":[["set_hook","Install the provided error hook"]],"struct":[["Report",""]]});
//! ```
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

const PREFIX: &str = "initSidebarItems(";
const SUFFIX: &str = ");";

/// The sidebar entries of a crate, grouped by item kind (`fn`, `struct`, `mod`, ...).
///
/// Both the order of the kinds and the order of the entries for each kind are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SidebarItems {
    sections: IndexMap<String, Vec<SidebarEntry>>,
}

/// A single sidebar entry: the name of the item and the first line of its docs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SidebarEntry {
    pub name: String,
    pub summary: String,
}

impl From<(String, String)> for SidebarEntry {
    fn from((name, summary): (String, String)) -> Self {
        Self { name, summary }
    }
}

impl From<SidebarEntry> for (String, String) {
    fn from(entry: SidebarEntry) -> Self {
        (entry.name, entry.summary)
    }
}

impl SidebarItems {
    /// Iterate over the item kinds, in file order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// The entries of a given kind.
    pub fn entries(&self, kind: &str) -> &[SidebarEntry] {
        self.sections.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Find an entry by name, returning its kind alongside it.
    pub fn find(&self, name: &str) -> Option<(&str, &SidebarEntry)> {
        self.sections.iter().find_map(|(kind, entries)| {
            entries
                .iter()
                .find(|e| e.name == name)
                .map(|e| (kind.as_str(), e))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SidebarEntry])> {
        self.sections
            .iter()
            .map(|(kind, entries)| (kind.as_str(), entries.as_slice()))
    }

    /// The total number of entries, across all kinds.
    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode the content of a `sidebar-items.js` file.
pub fn parse(source: &str) -> Result<SidebarItems, ParseSidebarError> {
    let payload = source
        .trim()
        .strip_prefix(PREFIX)
        .and_then(|s| s.strip_suffix(SUFFIX))
        .ok_or(ParseSidebarError::NotASidebarCall)?;
    serde_json::from_str(payload).map_err(ParseSidebarError::InvalidItems)
}

/// Render the content of a `sidebar-items.js` file.
pub fn emit(items: &SidebarItems) -> String {
    items.to_string()
}

impl Display for SidebarItems {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let payload = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{PREFIX}{payload}{SUFFIX}")
    }
}

#[derive(Debug, thiserror::Error)]
/// Failure modes of [`parse`].
pub enum ParseSidebarError {
    #[error("The file is not a single `initSidebarItems(...);` call")]
    NotASidebarCall,
    #[error("The sidebar items are not a mapping from item kinds to `[name, summary]` pairs")]
    InvalidItems(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::{emit, parse};

    const EYRE: &str = r#"initSidebarItems({"fn":[["set_hook","Install the provided error hook for constructing EyreHandlers when converting Errors to Reports"]],"macro":[["bail","Return early with an error."],["ensure","Return early with an error if a condition is not satisfied."],["eyre","Construct an ad-hoc error from a string."]],"type":[["Result","type alias for `Result<T, Report>`"]]});"#;

    #[test]
    fn kinds_and_entries_keep_file_order() {
        let items = parse(EYRE).unwrap();
        assert_eq!(items.kinds().collect::<Vec<_>>(), vec!["fn", "macro", "type"]);
        let macros: Vec<_> = items.entries("macro").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(macros, vec!["bail", "ensure", "eyre"]);
        assert_eq!(items.len(), 5);
        assert!(items.entries("struct").is_empty());
    }

    #[test]
    fn entries_can_be_looked_up_by_name() {
        let items = parse(EYRE).unwrap();
        let (kind, entry) = items.find("Result").unwrap();
        assert_eq!(kind, "type");
        assert_eq!(entry.summary, "type alias for `Result<T, Report>`");
        assert!(items.find("Report").is_none());
    }

    #[test]
    fn round_trip_is_exact() {
        assert_eq!(emit(&parse(EYRE).unwrap()), EYRE);
    }

    #[test]
    fn not_a_sidebar_call() {
        let err = parse("var items = {};").unwrap_err();
        insta::assert_snapshot!(err, @"The file is not a single `initSidebarItems(...);` call");
    }

    #[test]
    fn entries_must_be_pairs() {
        let err = parse(r#"initSidebarItems({"fn":[["set_hook"]]});"#).unwrap_err();
        insta::assert_snapshot!(err, @"The sidebar items are not a mapping from item kinds to `[name, summary]` pairs");
    }
}
